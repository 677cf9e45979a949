//! Sampling strategies over a [`ParameterSpace`]
//!
//! Every scalar component of every parameter is sampled independently
//! within the interval of its parameter:
//!
//! - uniform grids ([`ParameterSpace::sample_uniformly`]), enumerated lazily
//! - pure random draws ([`ParameterSpace::sample_randomly`])
//! - the logarithmic counterparts of both, which require positive intervals
//!
//! Grid and random values are generated inside the intervals, so every
//! produced [`Mu`] is contained in its space.

use std::collections::BTreeMap;
use std::iter::FusedIterator;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{MorError, Result};
use crate::parameters::bounds::Bounds;
use crate::parameters::mu::Mu;
use crate::parameters::parameters::Parameters;
use crate::parameters::space::ParameterSpace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration of random sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seed of the generator used by the random sampling methods
    ///
    /// Every call starts from this seed, so repeated calls return the same
    /// draws. `None` seeds from system entropy instead.
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { seed: Some(0) }
    }
}

impl SamplingConfig {
    /// Use a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Seed from system entropy on every call
    pub fn unseeded() -> Self {
        Self { seed: None }
    }

    /// A fresh generator according to this configuration
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Number of grid points per scalar component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCounts {
    /// The same count for every component
    Uniform(usize),

    /// A count per parameter name, shared by the components of that parameter
    PerParameter(BTreeMap<String, usize>),
}

impl GridCounts {
    /// Build [`GridCounts::PerParameter`] from `(name, count)` pairs
    pub fn per_parameter<I, K>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        GridCounts::PerParameter(
            counts
                .into_iter()
                .map(|(name, count)| (name.into(), count))
                .collect(),
        )
    }

    /// The count of every parameter of `parameters`, in ascending name order
    fn resolve(&self, parameters: &Parameters) -> Result<Vec<usize>> {
        match self {
            GridCounts::Uniform(count) => Ok(vec![*count; parameters.len()]),
            GridCounts::PerParameter(counts) => {
                if let Some(unknown) = counts.keys().find(|name| !parameters.contains(name)) {
                    return Err(MorError::UnknownParameter(unknown.clone()));
                }
                parameters
                    .names()
                    .map(|name| {
                        counts
                            .get(name)
                            .copied()
                            .ok_or_else(|| MorError::MissingParameter(name.to_string()))
                    })
                    .collect()
            }
        }
    }
}

impl From<usize> for GridCounts {
    fn from(count: usize) -> Self {
        GridCounts::Uniform(count)
    }
}

impl From<BTreeMap<String, usize>> for GridCounts {
    fn from(counts: BTreeMap<String, usize>) -> Self {
        GridCounts::PerParameter(counts)
    }
}

/// Lazy Cartesian product of per-component grids
///
/// Assignments are produced in lexicographic order: parameters by ascending
/// name, then component index, with the last component varying fastest.
/// Only the current grid position is held. A clone continues from the
/// position of the original.
///
/// When the number of assignments does not fit in a `usize`, [`total`](Self::total)
/// is `None` and the sequence can only be consumed partially, for example
/// with `take`. Collecting it in full is impossible.
#[derive(Debug, Clone)]
pub struct UniformSamples {
    parameters: Parameters,
    axes: Vec<Vec<f64>>,
    position: Vec<usize>,
    total: Option<usize>,
    emitted: usize,
    exhausted: bool,
}

impl UniformSamples {
    fn new(parameters: Parameters, axes: Vec<Vec<f64>>) -> Self {
        let total = axes
            .iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.len()));
        if total.is_none() {
            warn!(
                parameters = %parameters,
                "grid cardinality exceeds usize, only partial enumeration is possible"
            );
        }
        let exhausted = axes.iter().any(Vec::is_empty);
        let position = vec![0; axes.len()];
        Self {
            parameters,
            axes,
            position,
            total,
            emitted: 0,
            exhausted,
        }
    }

    /// Total number of assignments, or `None` if it does not fit in a `usize`
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// The assignment at `index` in enumeration order
    pub fn get(&self, index: usize) -> Option<Mu> {
        if index >= self.total? {
            return None;
        }
        let mut remainder = index;
        let mut position = vec![0; self.axes.len()];
        for (slot, axis) in position.iter_mut().zip(&self.axes).rev() {
            *slot = remainder % axis.len();
            remainder /= axis.len();
        }
        Some(self.point(&position))
    }

    fn point(&self, position: &[usize]) -> Mu {
        let mut components = position
            .iter()
            .zip(&self.axes)
            .map(|(&index, axis)| axis[index]);
        let values: BTreeMap<String, Array1<f64>> = self
            .parameters
            .iter()
            .map(|(name, size)| {
                let value: Array1<f64> = components.by_ref().take(size).collect();
                (name.to_string(), value)
            })
            .collect();
        Mu::from_static(values, 0.0, BTreeMap::new())
    }

    fn advance(&mut self) {
        for (slot, axis) in self.position.iter_mut().zip(&self.axes).rev() {
            *slot += 1;
            if *slot < axis.len() {
                return;
            }
            *slot = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for UniformSamples {
    type Item = Mu;

    fn next(&mut self) -> Option<Mu> {
        if self.exhausted {
            return None;
        }
        let mu = self.point(&self.position);
        self.emitted += 1;
        self.advance();
        Some(mu)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        match self.total {
            Some(total) => {
                let remaining = total - self.emitted;
                (remaining, Some(remaining))
            }
            // Remaining count is not representable
            None => (0, None),
        }
    }
}

impl FusedIterator for UniformSamples {}

impl ParameterSpace {
    /// Equally spaced grid over every scalar component
    ///
    /// Yields `count^dim` assignments for [`GridCounts::Uniform`]. The first
    /// and last grid points of every component are its interval ends.
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::Parameters;
    ///
    /// let space = Parameters::new([("x", 1)]).unwrap().space((0.1, 1.0)).unwrap();
    /// let samples: Vec<_> = space.sample_uniformly(100).unwrap().collect();
    /// assert_eq!(samples.len(), 100);
    /// assert_eq!(samples[0].get("x").unwrap()[0], 0.1);
    /// assert_eq!(samples[99].get("x").unwrap()[0], 1.0);
    /// ```
    pub fn sample_uniformly(&self, counts: impl Into<GridCounts>) -> Result<UniformSamples> {
        let counts = counts.into();
        debug!(space = %self.parameters(), dim = self.dim(), ?counts, "sampling uniform grid");
        let axes = self.axes(&counts, |bounds, count| Ok(bounds.grid(count)))?;
        Ok(UniformSamples::new(self.parameters().clone(), axes))
    }

    /// Grid equally spaced in `ln(value)` over every scalar component
    ///
    /// # Returns
    ///
    /// A `DomainError` unless every interval is strictly positive
    pub fn sample_logarithmic_uniformly(
        &self,
        counts: impl Into<GridCounts>,
    ) -> Result<UniformSamples> {
        let counts = counts.into();
        debug!(space = %self.parameters(), dim = self.dim(), ?counts, "sampling logarithmic grid");
        let axes = self.axes(&counts, |bounds, count| bounds.log_grid(count))?;
        Ok(UniformSamples::new(self.parameters().clone(), axes))
    }

    /// Evaluate `f` on every grid assignment in parallel, keeping enumeration order
    ///
    /// # Returns
    ///
    /// A `DomainError` if the grid is too large to index
    #[cfg(feature = "parallel")]
    pub fn par_map_uniformly<T, F>(&self, counts: impl Into<GridCounts>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(Mu) -> T + Sync + Send,
    {
        let samples = self.sample_uniformly(counts)?;
        let total = samples.total().ok_or_else(|| {
            MorError::DomainError("grid is too large to enumerate".to_string())
        })?;
        Ok((0..total)
            .into_par_iter()
            .filter_map(|index| samples.get(index))
            .map(f)
            .collect())
    }

    /// One uniformly random assignment drawn with the configured seed
    pub fn sample_random(&self) -> Mu {
        self.sample_random_with_rng(&mut self.sampling_config().rng())
    }

    /// One uniformly random assignment drawn from `rng`
    pub fn sample_random_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Mu {
        let components: Vec<f64> = self
            .component_bounds()
            .iter()
            .map(|bounds| bounds.sample(rng))
            .collect();
        self.static_point(components)
    }

    /// `count` i.i.d. uniformly random assignments drawn with the configured seed
    pub fn sample_randomly(&self, count: usize) -> Vec<Mu> {
        debug!(space = %self.parameters(), dim = self.dim(), count, "sampling randomly");
        self.sample_randomly_with_rng(count, &mut self.sampling_config().rng())
    }

    /// `count` i.i.d. uniformly random assignments drawn from `rng`
    pub fn sample_randomly_with_rng<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Mu> {
        (0..count)
            .map(|_| self.sample_random_with_rng(rng))
            .collect()
    }

    /// One log-uniformly random assignment drawn with the configured seed
    pub fn sample_logarithmic_random(&self) -> Result<Mu> {
        self.sample_logarithmic_random_with_rng(&mut self.sampling_config().rng())
    }

    /// One log-uniformly random assignment drawn from `rng`
    pub fn sample_logarithmic_random_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Mu> {
        let components = self
            .component_bounds()
            .iter()
            .map(|bounds| bounds.sample_log(rng))
            .collect::<Result<Vec<f64>>>()?;
        Ok(self.static_point(components))
    }

    /// `count` i.i.d. log-uniformly random assignments drawn with the configured seed
    ///
    /// # Returns
    ///
    /// A `DomainError` unless every interval is strictly positive, even for `count == 0`
    pub fn sample_logarithmic_randomly(&self, count: usize) -> Result<Vec<Mu>> {
        debug!(space = %self.parameters(), dim = self.dim(), count, "sampling logarithmically at random");
        self.sample_logarithmic_randomly_with_rng(count, &mut self.sampling_config().rng())
    }

    /// `count` i.i.d. log-uniformly random assignments drawn from `rng`
    pub fn sample_logarithmic_randomly_with_rng<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Mu>> {
        self.check_positive()?;
        (0..count)
            .map(|_| self.sample_logarithmic_random_with_rng(rng))
            .collect()
    }

    fn axes(
        &self,
        counts: &GridCounts,
        grid: impl Fn(&Bounds, usize) -> Result<Vec<f64>>,
    ) -> Result<Vec<Vec<f64>>> {
        let counts = counts.resolve(self.parameters())?;
        let mut axes = Vec::with_capacity(self.dim());
        for ((name, size), count) in self.parameters().iter().zip(counts) {
            let bounds = self
                .bounds(name)
                .ok_or_else(|| MorError::MissingParameter(name.to_string()))?;
            let axis = grid(&bounds, count)?;
            axes.extend(std::iter::repeat(axis).take(size));
        }
        Ok(axes)
    }

    fn check_positive(&self) -> Result<()> {
        match self.ranges().iter().find(|(_, bounds)| !bounds.is_positive()) {
            Some((name, bounds)) => Err(MorError::DomainError(format!(
                "logarithmic sampling of '{}' requires positive bounds, got [{}, {}]",
                name, bounds.low, bounds.high
            ))),
            None => Ok(()),
        }
    }

    fn static_point(&self, components: Vec<f64>) -> Mu {
        let mut components = components.into_iter();
        let values = self
            .parameters()
            .iter()
            .map(|(name, size)| {
                let value: Array1<f64> = components.by_ref().take(size).collect();
                (name.to_string(), value)
            })
            .collect();
        Mu::from_static(values, 0.0, BTreeMap::new())
    }
}
