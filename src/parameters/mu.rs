//! Parameter values
//!
//! A [`Mu`] binds every parameter name to a concrete 1-D array, or to a
//! [`TimeFunction`] evaluated at the assignment's own time `t`. Assignments
//! are immutable; every modifying operation returns a new value.
//!
//! Arithmetic works on the flattened vector (see [`Mu::to_array`]) and keeps
//! the time of the left operand.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use ndarray::Array1;

use crate::error::{MorError, Result};
use crate::parameters::expression::TIME_VARIABLE;
use crate::parameters::functions::TimeFunction;
use crate::parameters::parameters::{check_name, Parameters};

#[derive(Debug, Clone)]
struct Entry {
    rule: TimeFunction,
    value: Array1<f64>,
}

/// An immutable assignment of values to parameters
#[derive(Debug, Clone)]
pub struct Mu {
    entries: BTreeMap<String, Entry>,
    t: f64,
    additional: BTreeMap<String, Array1<f64>>,
}

impl Mu {
    /// Create an assignment from `(name, value)` pairs
    ///
    /// The schema is implied by the lengths of the values. The reserved name
    /// `t` sets the time and must be a finite static scalar.
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::Mu;
    ///
    /// let mu = Mu::new([("a", vec![7.0]), ("b", vec![1.0, 2.0])]).unwrap();
    /// assert_eq!(mu.get("b").unwrap().to_vec(), vec![1.0, 2.0]);
    /// assert_eq!(mu.t(), 0.0);
    /// assert_eq!(mu.to_array().to_vec(), vec![7.0, 1.0, 2.0]);
    /// ```
    pub fn new<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<TimeFunction>,
    {
        let mut t = 0.0;
        let mut rules = BTreeMap::new();
        for (name, value) in entries {
            let name = name.into();
            let rule = value.into();
            if name == TIME_VARIABLE {
                t = time_from_rule(&rule)?;
            } else {
                rules.insert(name, rule);
            }
        }
        Self::from_rules(rules, t)
    }

    /// Evaluate `rules` at `t` and validate the results.
    pub(crate) fn from_rules(rules: BTreeMap<String, TimeFunction>, t: f64) -> Result<Self> {
        check_time(t)?;
        let mut entries = BTreeMap::new();
        for (name, rule) in rules {
            check_name(&name)?;
            let value = rule.evaluate_checked(&name, t)?;
            entries.insert(name, Entry { rule, value });
        }
        Ok(Self {
            entries,
            t,
            additional: BTreeMap::new(),
        })
    }

    /// Assemble an assignment from static values that are already known to be valid.
    pub(crate) fn from_static(
        values: BTreeMap<String, Array1<f64>>,
        t: f64,
        additional: BTreeMap<String, Array1<f64>>,
    ) -> Self {
        let entries = values
            .into_iter()
            .map(|(name, value)| {
                let entry = Entry {
                    rule: TimeFunction::Constant(value.clone()),
                    value,
                };
                (name, entry)
            })
            .collect();
        Self {
            entries,
            t,
            additional,
        }
    }

    /// The current value of parameter `name`
    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    /// Like [`Mu::get`] but with an `UnknownParameter` error for missing names
    pub fn value(&self, name: &str) -> Result<&Array1<f64>> {
        self.get(name)
            .ok_or_else(|| MorError::UnknownParameter(name.to_string()))
    }

    /// The time at which all entries are evaluated
    pub fn t(&self) -> f64 {
        self.t
    }

    /// The rule behind parameter `name`; static values use the constant wrapper
    pub fn get_time_dependent_value(&self, name: &str) -> Option<&TimeFunction> {
        self.entries.get(name).map(|entry| &entry.rule)
    }

    /// Whether parameter `name` is backed by a non-constant rule
    pub fn is_time_dependent(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map_or(false, |entry| !entry.rule.is_constant())
    }

    /// Whether any parameter is time-dependent
    pub fn has_time_dependence(&self) -> bool {
        self.entries.values().any(|entry| !entry.rule.is_constant())
    }

    /// A copy with time `t`; time-dependent entries are re-evaluated
    pub fn with_t(&self, t: f64) -> Result<Self> {
        self.with_changes(Some(t), Vec::<(String, Array1<f64>)>::new())
    }

    /// A copy with an optional new time and static overrides
    ///
    /// Every override must name an existing parameter and keep its length.
    /// Overridden entries become static.
    pub fn with_changes<I, K, V>(&self, t: Option<f64>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Array1<f64>>,
    {
        let t = t.unwrap_or(self.t);
        let mut rules: BTreeMap<String, TimeFunction> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.rule.clone()))
            .collect();

        for (name, value) in overrides {
            let name = name.into();
            let value = value.into();
            if name == TIME_VARIABLE {
                return Err(MorError::DomainError(
                    "time must be changed through the `t` argument".to_string(),
                ));
            }
            let current = self
                .get(&name)
                .ok_or_else(|| MorError::UnknownParameter(name.clone()))?;
            if current.len() != value.len() {
                return Err(MorError::ShapeMismatch {
                    name,
                    expected: current.len(),
                    actual: value.len(),
                });
            }
            rules.insert(name, TimeFunction::Constant(value));
        }

        let mut mu = Self::from_rules(rules, t)?;
        mu.additional = self.additional.clone();
        Ok(mu)
    }

    /// The schema implied by this assignment; additional fields are not included
    pub fn parameters(&self) -> Parameters {
        Parameters::from_validated(
            self.entries
                .iter()
                .map(|(name, entry)| (name.clone(), entry.value.len()))
                .collect(),
        )
    }

    /// Parameter names in ascending order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, current value)` pairs in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.value))
    }

    /// Whether parameter `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of parameters, not counting `t` or additional fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the assignment has no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undeclared fields retained by [`ParameterSpace::clip`](crate::parameters::ParameterSpace::clip)
    pub fn additional(&self) -> &BTreeMap<String, Array1<f64>> {
        &self.additional
    }

    /// Concatenate all values in ascending name order
    ///
    /// With `include_time`, `t` is placed at the position of its name.
    pub fn flatten(&self, include_time: bool) -> Array1<f64> {
        let time = [self.t];
        let mut parts: Vec<(&str, &[f64])> = self
            .entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.value.as_slice().unwrap_or(&[])))
            .collect();
        if include_time {
            parts.push((TIME_VARIABLE, &time[..]));
            parts.sort_by(|a, b| a.0.cmp(b.0));
        }
        parts
            .into_iter()
            .flat_map(|(_, values)| values.iter().copied())
            .collect()
    }

    /// The flattened vector without `t`
    pub fn to_array(&self) -> Array1<f64> {
        self.flatten(false)
    }

    /// `self + other`; both operands must have the same schema
    pub fn try_add(&self, other: &Mu) -> Result<Mu> {
        self.zip_with(other, |a, b| a + b)
    }

    /// `self - other`; both operands must have the same schema
    pub fn try_sub(&self, other: &Mu) -> Result<Mu> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Add a flat vector laid out like [`Mu::to_array`]
    pub fn try_add_array(&self, other: &Array1<f64>) -> Result<Mu> {
        self.combine_flat(other, |a, b| a + b)
    }

    /// Subtract a flat vector laid out like [`Mu::to_array`]
    pub fn try_sub_array(&self, other: &Array1<f64>) -> Result<Mu> {
        self.combine_flat(other, |a, b| a - b)
    }

    /// Multiply every component by `factor`
    ///
    /// Fails with `InvalidValue` if a product is not finite.
    pub fn scale(&self, factor: f64) -> Result<Mu> {
        let scaled: Vec<f64> = self.to_array().iter().map(|v| v * factor).collect();
        self.parameters().unflatten(&scaled, self.t)
    }

    fn zip_with(&self, other: &Mu, op: impl Fn(f64, f64) -> f64) -> Result<Mu> {
        let left = self.parameters();
        let right = other.parameters();
        if left != right {
            return Err(MorError::IncompatibleSchemas {
                left: left.to_string(),
                right: right.to_string(),
            });
        }
        self.combine_flat(&other.to_array(), op)
    }

    fn combine_flat(&self, other: &Array1<f64>, op: impl Fn(f64, f64) -> f64) -> Result<Mu> {
        let flat = self.to_array();
        if flat.len() != other.len() {
            return Err(MorError::ShapeMismatch {
                name: "<flattened>".to_string(),
                expected: flat.len(),
                actual: other.len(),
            });
        }
        let combined: Vec<f64> = flat.iter().zip(other.iter()).map(|(&a, &b)| op(a, b)).collect();
        self.parameters().unflatten(&combined, self.t)
    }

    fn negated(&self) -> Mu {
        let values = self
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.value.mapv(|v| -v)))
            .collect();
        Mu::from_static(values, self.t, BTreeMap::new())
    }

    /// Attach undeclared fields.
    pub(crate) fn with_additional(mut self, additional: BTreeMap<String, Array1<f64>>) -> Self {
        self.additional = additional;
        self
    }
}

fn check_time(t: f64) -> Result<()> {
    if t.is_finite() {
        Ok(())
    } else {
        Err(MorError::DomainError(format!("time must be finite, got {}", t)))
    }
}

fn time_from_rule(rule: &TimeFunction) -> Result<f64> {
    match rule.constant_value() {
        Some(value) if value.len() == 1 => {
            let t = value[0];
            check_time(t)?;
            Ok(t)
        }
        Some(value) => Err(MorError::DomainError(format!(
            "time must be a scalar, got {} components",
            value.len()
        ))),
        None => Err(MorError::DomainError(
            "time cannot itself be time-dependent".to_string(),
        )),
    }
}

impl Default for Mu {
    fn default() -> Self {
        Self::from_static(BTreeMap::new(), 0.0, BTreeMap::new())
    }
}

/// Equal names, equal current values and equal additional fields; `t` is not compared.
impl PartialEq for Mu {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((n1, e1), (n2, e2))| n1 == n2 && e1.value == e2.value)
            && self.additional == other.additional
    }
}

impl fmt::Display for Mu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let fields = self.iter().chain(self.additional.iter().map(|(n, v)| (n.as_str(), v)));
        for (name, value) in fields {
            write!(f, "{}: [", name)?;
            for (i, v) in value.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "], ")?;
        }
        write!(f, "t: {}}}", self.t)
    }
}

impl Add<&Mu> for &Mu {
    type Output = Result<Mu>;

    fn add(self, rhs: &Mu) -> Result<Mu> {
        self.try_add(rhs)
    }
}

impl Add for Mu {
    type Output = Result<Mu>;

    fn add(self, rhs: Mu) -> Result<Mu> {
        self.try_add(&rhs)
    }
}

impl Add<&Array1<f64>> for &Mu {
    type Output = Result<Mu>;

    fn add(self, rhs: &Array1<f64>) -> Result<Mu> {
        self.try_add_array(rhs)
    }
}

impl Sub<&Mu> for &Mu {
    type Output = Result<Mu>;

    fn sub(self, rhs: &Mu) -> Result<Mu> {
        self.try_sub(rhs)
    }
}

impl Sub for Mu {
    type Output = Result<Mu>;

    fn sub(self, rhs: Mu) -> Result<Mu> {
        self.try_sub(&rhs)
    }
}

impl Sub<&Array1<f64>> for &Mu {
    type Output = Result<Mu>;

    fn sub(self, rhs: &Array1<f64>) -> Result<Mu> {
        self.try_sub_array(rhs)
    }
}

impl Neg for &Mu {
    type Output = Mu;

    fn neg(self) -> Mu {
        self.negated()
    }
}

impl Neg for Mu {
    type Output = Mu;

    fn neg(self) -> Mu {
        -&self
    }
}

impl Mul<f64> for &Mu {
    type Output = Result<Mu>;

    fn mul(self, factor: f64) -> Result<Mu> {
        self.scale(factor)
    }
}

impl Mul<f64> for Mu {
    type Output = Result<Mu>;

    fn mul(self, factor: f64) -> Result<Mu> {
        self.scale(factor)
    }
}

impl Mul<&Mu> for f64 {
    type Output = Result<Mu>;

    fn mul(self, mu: &Mu) -> Result<Mu> {
        mu.scale(self)
    }
}

impl Mul<Mu> for f64 {
    type Output = Result<Mu>;

    fn mul(self, mu: Mu) -> Result<Mu> {
        mu.scale(self)
    }
}
