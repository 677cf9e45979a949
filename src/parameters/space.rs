//! Parameter spaces
//!
//! A [`ParameterSpace`] is a [`Parameters`] schema together with a closed
//! interval per parameter. The interval of a parameter applies to each of
//! its components. Sampling lives in [`sampler`](crate::parameters::sampler).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MorError, Result};
use crate::parameters::bounds::Bounds;
use crate::parameters::mu::Mu;
use crate::parameters::parameters::Parameters;
use crate::parameters::sampler::SamplingConfig;

/// Ranges given when building a [`ParameterSpace`]
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterRanges {
    /// The same `(low, high)` for every parameter
    Uniform(f64, f64),

    /// A `(low, high)` per parameter name
    PerParameter(BTreeMap<String, (f64, f64)>),
}

impl ParameterRanges {
    /// Build [`ParameterRanges::PerParameter`] from `(name, (low, high))` pairs
    pub fn per_parameter<I, K>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (K, (f64, f64))>,
        K: Into<String>,
    {
        ParameterRanges::PerParameter(
            ranges
                .into_iter()
                .map(|(name, range)| (name.into(), range))
                .collect(),
        )
    }
}

impl From<(f64, f64)> for ParameterRanges {
    fn from((low, high): (f64, f64)) -> Self {
        ParameterRanges::Uniform(low, high)
    }
}

impl From<BTreeMap<String, (f64, f64)>> for ParameterRanges {
    fn from(ranges: BTreeMap<String, (f64, f64)>) -> Self {
        ParameterRanges::PerParameter(ranges)
    }
}

/// A schema with a closed interval per parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpaceRepr", into = "SpaceRepr")]
pub struct ParameterSpace {
    parameters: Parameters,
    ranges: BTreeMap<String, Bounds>,
    sampling: SamplingConfig,
}

#[derive(Serialize, Deserialize)]
struct SpaceRepr {
    parameters: Parameters,
    ranges: BTreeMap<String, Bounds>,
    #[serde(default)]
    sampling: SamplingConfig,
}

impl ParameterSpace {
    /// Create a space over `parameters`
    ///
    /// # Returns
    ///
    /// An error if a range is invalid, or if per-parameter ranges miss a
    /// declared name or name an undeclared one
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::{ParameterSpace, Parameters};
    ///
    /// let params = Parameters::new([("diffusion", 2)]).unwrap();
    /// let space = ParameterSpace::new(params, (0.1, 1.0)).unwrap();
    /// assert_eq!(space.bounds("diffusion").unwrap().high, 1.0);
    /// ```
    pub fn new(parameters: Parameters, ranges: impl Into<ParameterRanges>) -> Result<Self> {
        let ranges = match ranges.into() {
            ParameterRanges::Uniform(low, high) => {
                let bounds = Bounds::new(low, high)?;
                parameters
                    .names()
                    .map(|name| (name.to_string(), bounds))
                    .collect()
            }
            ParameterRanges::PerParameter(mut ranges) => {
                if let Some(unknown) = ranges.keys().find(|name| !parameters.contains(name)) {
                    return Err(MorError::UnknownParameter(unknown.clone()));
                }
                let mut resolved = BTreeMap::new();
                for name in parameters.names() {
                    let (low, high) = ranges
                        .remove(name)
                        .ok_or_else(|| MorError::MissingParameter(name.to_string()))?;
                    resolved.insert(name.to_string(), Bounds::new(low, high)?);
                }
                resolved
            }
        };

        debug!(
            dim = parameters.dim(),
            parameters = %parameters,
            "parameter space created"
        );

        Ok(Self {
            parameters,
            ranges,
            sampling: SamplingConfig::default(),
        })
    }

    /// A copy using `config` for random sampling
    pub fn with_sampling_config(mut self, config: SamplingConfig) -> Self {
        self.sampling = config;
        self
    }

    /// The underlying schema
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The interval of every parameter
    pub fn ranges(&self) -> &BTreeMap<String, Bounds> {
        &self.ranges
    }

    /// The interval of parameter `name`
    pub fn bounds(&self, name: &str) -> Option<Bounds> {
        self.ranges.get(name).copied()
    }

    /// The random sampling configuration
    pub fn sampling_config(&self) -> &SamplingConfig {
        &self.sampling
    }

    /// Total number of scalar components
    pub fn dim(&self) -> usize {
        self.parameters.dim()
    }

    /// Whether `mu` is compatible and every declared component lies in its interval
    pub fn contains(&self, mu: &Mu) -> bool {
        self.contains_with_tolerance(mu, 0.0)
    }

    /// Like [`ParameterSpace::contains`], widening every interval by `tolerance`
    pub fn contains_with_tolerance(&self, mu: &Mu, tolerance: f64) -> bool {
        if !self.parameters.is_compatible(mu) {
            return false;
        }
        self.ranges.iter().all(|(name, bounds)| {
            mu.get(name).map_or(false, |value| {
                value
                    .iter()
                    .all(|&v| bounds.contains_with_tolerance(v, tolerance))
            })
        })
    }

    /// Clamp every declared component of `mu` into its interval
    ///
    /// Undeclared fields of `mu` (entries or previously retained additional
    /// fields) are kept as additional fields when `keep_additional` is true
    /// and dropped otherwise. Time-dependent entries are clamped at the
    /// current time and become static. `t` is kept.
    pub fn clip(&self, mu: &Mu, keep_additional: bool) -> Mu {
        let mut values = BTreeMap::new();
        let mut additional = BTreeMap::new();

        for (name, value) in mu.iter() {
            match self.ranges.get(name) {
                Some(bounds) => {
                    values.insert(name.to_string(), value.mapv(|v| bounds.clamp(v)));
                }
                None if keep_additional => {
                    additional.insert(name.to_string(), value.clone());
                }
                None => {}
            }
        }
        if keep_additional {
            for (name, value) in mu.additional() {
                additional
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }

        Mu::from_static(values, mu.t(), BTreeMap::new()).with_additional(additional)
    }

    /// The bounds of every scalar component, in flattening order.
    pub(crate) fn component_bounds(&self) -> Vec<Bounds> {
        self.parameters
            .iter()
            .flat_map(|(name, size)| {
                let bounds = self.ranges[name];
                std::iter::repeat(bounds).take(size)
            })
            .collect()
    }

    /// Serialize the space to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a space from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TryFrom<SpaceRepr> for ParameterSpace {
    type Error = MorError;

    fn try_from(repr: SpaceRepr) -> Result<Self> {
        let ranges: BTreeMap<String, (f64, f64)> = repr
            .ranges
            .into_iter()
            .map(|(name, bounds)| (name, (bounds.low, bounds.high)))
            .collect();
        Ok(ParameterSpace::new(repr.parameters, ranges)?.with_sampling_config(repr.sampling))
    }
}

impl From<ParameterSpace> for SpaceRepr {
    fn from(space: ParameterSpace) -> Self {
        SpaceRepr {
            parameters: space.parameters,
            ranges: space.ranges,
            sampling: space.sampling,
        }
    }
}
