//! Parameter schema implementation
//!
//! This module provides the Parameters struct, an immutable registry mapping
//! parameter names to the number of components of each parameter.

use crate::error::{MorError, Result};
use crate::parameters::expression::TIME_VARIABLE;
use crate::parameters::mu::Mu;
use crate::parameters::parser::{self, ParameterInput, ParseOptions};
use crate::parameters::space::{ParameterRanges, ParameterSpace};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Sub;

/// The parameters an object depends on: name -> number of components
///
/// Names are kept in ascending order, which is also the order used when an
/// assignment is flattened into a single vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct Parameters {
    sizes: BTreeMap<String, usize>,
}

impl Parameters {
    /// Create a schema from `(name, size)` pairs
    ///
    /// # Returns
    ///
    /// An error if a size is zero, a name is empty or reserved, or the same
    /// name is given twice with different sizes
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::Parameters;
    ///
    /// let params = Parameters::new([("b", 2), ("a", 1)]).unwrap();
    /// assert_eq!(params.dim(), 3);
    /// assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "b"]);
    /// ```
    pub fn new<I, K>(sizes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, size) in sizes {
            let name = name.into();
            check_entry(&name, size)?;
            if let Some(&existing) = map.get(&name) {
                if existing != size {
                    return Err(MorError::SchemaConflict {
                        name,
                        left: existing,
                        right: size,
                    });
                }
            }
            map.insert(name, size);
        }
        Ok(Self { sizes: map })
    }

    /// The schema of a non-parametric object
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema built from sizes that are already known to be valid.
    pub(crate) fn from_validated(sizes: BTreeMap<String, usize>) -> Self {
        Self { sizes }
    }

    /// Union of several schemas
    pub fn of<'a, I>(schemas: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Parameters>,
    {
        schemas
            .into_iter()
            .try_fold(Parameters::empty(), |acc, schema| acc.union(schema))
    }

    /// Merge two schemas
    ///
    /// # Returns
    ///
    /// A `SchemaConflict` error if a shared name has different sizes
    pub fn union(&self, other: &Parameters) -> Result<Self> {
        let mut sizes = self.sizes.clone();
        for (name, &size) in &other.sizes {
            match sizes.get(name) {
                Some(&existing) if existing != size => {
                    return Err(MorError::SchemaConflict {
                        name: name.clone(),
                        left: existing,
                        right: size,
                    })
                }
                Some(_) => {}
                None => {
                    sizes.insert(name.clone(), size);
                }
            }
        }
        Ok(Self { sizes })
    }

    /// The parameters of `self` whose names do not appear in `other`
    pub fn difference(&self, other: &Parameters) -> Self {
        Self {
            sizes: self
                .sizes
                .iter()
                .filter(|(name, _)| !other.sizes.contains_key(*name))
                .map(|(name, &size)| (name.clone(), size))
                .collect(),
        }
    }

    /// Whether every parameter of `self` appears in `other` with the same size
    pub fn is_subset_of(&self, other: &Parameters) -> bool {
        self.sizes
            .iter()
            .all(|(name, size)| other.sizes.get(name) == Some(size))
    }

    /// Number of components of parameter `name`
    pub fn get(&self, name: &str) -> Option<usize> {
        self.sizes.get(name).copied()
    }

    /// Whether `name` is declared
    pub fn contains(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }

    /// Number of declared parameters
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether no parameters are declared
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Declared names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sizes.keys().map(String::as_str)
    }

    /// `(name, size)` pairs in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.sizes.iter().map(|(name, &size)| (name.as_str(), size))
    }

    /// Total number of scalar components
    pub fn dim(&self) -> usize {
        self.sizes.values().sum()
    }

    /// Whether `mu` provides every declared parameter with the declared size
    ///
    /// Names of `mu` that are not declared here are ignored.
    pub fn is_compatible(&self, mu: &Mu) -> bool {
        self.why_incompatible(mu).is_none()
    }

    /// A human-readable reason why `mu` is not compatible, if it is not
    pub fn why_incompatible(&self, mu: &Mu) -> Option<String> {
        self.assert_compatible(mu).err().map(|err| err.to_string())
    }

    /// Check compatibility of `mu`, reporting the first violation
    pub fn assert_compatible(&self, mu: &Mu) -> Result<()> {
        for (name, &size) in &self.sizes {
            match mu.get(name) {
                None => return Err(MorError::MissingParameter(name.clone())),
                Some(value) if value.len() != size => {
                    return Err(MorError::ShapeMismatch {
                        name: name.clone(),
                        expected: size,
                        actual: value.len(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Parse literal parameter data into a [`Mu`] conforming to this schema
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::{Literal, ParameterInput, Parameters};
    ///
    /// let params = Parameters::new([("b", 2), ("a", 1)]).unwrap();
    ///
    /// // Flat values are assigned in ascending name order: a, then b
    /// let mu = params.parse(vec![1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(mu.get("b").unwrap().to_vec(), vec![2.0, 3.0]);
    ///
    /// let input = ParameterInput::Flat(vec![
    ///     Literal::from(7.0),
    ///     Literal::from("t**2"),
    ///     Literal::from("t[0]"),
    /// ]);
    /// let mu = params.parse(input).unwrap().with_t(3.0).unwrap();
    /// assert_eq!(mu.get("b").unwrap().to_vec(), vec![9.0, 3.0]);
    /// ```
    pub fn parse(&self, input: impl Into<ParameterInput>) -> Result<Mu> {
        parser::parse(self, input.into(), &ParseOptions::default())
    }

    /// Like [`Parameters::parse`] with explicit options
    pub fn parse_with(&self, input: impl Into<ParameterInput>, options: &ParseOptions) -> Result<Mu> {
        parser::parse(self, input.into(), options)
    }

    /// Split a flat vector into per-name arrays, walking names in ascending order
    pub(crate) fn unflatten(&self, flat: &[f64], t: f64) -> Result<Mu> {
        if flat.len() != self.dim() {
            return Err(MorError::ShapeMismatch {
                name: "<flattened>".to_string(),
                expected: self.dim(),
                actual: flat.len(),
            });
        }
        if let Some(position) = flat.iter().position(|v| !v.is_finite()) {
            return Err(MorError::InvalidValue(format!(
                "component {} of the flattened assignment is not finite: {}",
                position, flat[position]
            )));
        }
        let mut offset = 0;
        let mut values = BTreeMap::new();
        for (name, &size) in &self.sizes {
            values.insert(
                name.clone(),
                Array1::from(flat[offset..offset + size].to_vec()),
            );
            offset += size;
        }
        Ok(Mu::from_static(values, t, BTreeMap::new()))
    }

    /// A [`ParameterSpace`] over this schema with the given ranges
    pub fn space(&self, ranges: impl Into<ParameterRanges>) -> Result<ParameterSpace> {
        ParameterSpace::new(self.clone(), ranges)
    }

    /// Serialize the schema to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a schema from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reject empty names and the reserved time name.
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MorError::InvalidValue(
            "parameter names must not be empty".to_string(),
        ));
    }
    if name == TIME_VARIABLE {
        return Err(MorError::InvalidValue(format!(
            "'{}' is reserved for time",
            TIME_VARIABLE
        )));
    }
    Ok(())
}

fn check_entry(name: &str, size: usize) -> Result<()> {
    check_name(name)?;
    if size == 0 {
        return Err(MorError::InvalidValue(format!(
            "parameter '{}' must have a positive size",
            name
        )));
    }
    Ok(())
}

impl TryFrom<BTreeMap<String, usize>> for Parameters {
    type Error = MorError;

    fn try_from(sizes: BTreeMap<String, usize>) -> Result<Self> {
        Parameters::new(sizes)
    }
}

impl From<Parameters> for BTreeMap<String, usize> {
    fn from(params: Parameters) -> Self {
        params.sizes
    }
}

impl Sub for &Parameters {
    type Output = Parameters;

    fn sub(self, other: &Parameters) -> Parameters {
        self.difference(other)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, size)) in self.sizes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, size)?;
        }
        write!(f, "}}")
    }
}
