//! Time-dependent parameter values
//!
//! Every entry of a [`Mu`](crate::parameters::Mu) is stored as a rule
//! `t -> array`. Static values use the [`TimeFunction::Constant`] wrapper so
//! that static and dynamic entries share one access path.

use std::fmt;
use std::sync::Arc;

use ndarray::Array1;

use crate::error::{MorError, Result};
use crate::parameters::expression::CompiledExpression;

/// Signature of caller-supplied rules.
pub type TimeRule = dyn Fn(f64) -> Array1<f64> + Send + Sync;

/// A rule producing a parameter value as a function of time.
#[derive(Clone)]
pub enum TimeFunction {
    /// A value that does not depend on `t`
    Constant(Array1<f64>),

    /// A compiled expression referencing `t`
    Expression(CompiledExpression),

    /// An opaque caller-supplied rule producing `len` components
    Custom { len: usize, rule: Arc<TimeRule> },
}

impl TimeFunction {
    /// Wrap a static value.
    pub fn constant(value: impl Into<Array1<f64>>) -> Self {
        TimeFunction::Constant(value.into())
    }

    /// Wrap an arbitrary rule producing `len` components.
    ///
    /// Custom rules are always reported as time-dependent.
    pub fn custom<F>(len: usize, rule: F) -> Self
    where
        F: Fn(f64) -> Array1<f64> + Send + Sync + 'static,
    {
        TimeFunction::Custom {
            len,
            rule: Arc::new(rule),
        }
    }

    /// Turn a compiled expression into a rule.
    ///
    /// Expressions that do not reference `t` are folded into a constant.
    pub fn from_expression(expression: CompiledExpression) -> Result<Self> {
        if expression.references_time() {
            Ok(TimeFunction::Expression(expression))
        } else {
            Ok(TimeFunction::Constant(expression.evaluate(0.0)?))
        }
    }

    /// Number of components produced per evaluation
    pub fn len(&self) -> usize {
        match self {
            TimeFunction::Constant(value) => value.len(),
            TimeFunction::Expression(expression) => expression.len(),
            TimeFunction::Custom { len, .. } => *len,
        }
    }

    /// Whether the rule produces no components
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the constant wrapper
    pub fn is_constant(&self) -> bool {
        matches!(self, TimeFunction::Constant(_))
    }

    /// The wrapped value if this is the constant wrapper
    pub fn constant_value(&self) -> Option<&Array1<f64>> {
        match self {
            TimeFunction::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Evaluate the rule at time `t`.
    ///
    /// The result is not validated; see [`TimeFunction::evaluate_checked`].
    pub fn evaluate(&self, t: f64) -> Result<Array1<f64>> {
        match self {
            TimeFunction::Constant(value) => Ok(value.clone()),
            TimeFunction::Expression(expression) => Ok(expression.evaluate(t)?),
            TimeFunction::Custom { rule, .. } => Ok(rule(t)),
        }
    }

    /// Evaluate the rule for the parameter `name`, checking length and finiteness.
    pub(crate) fn evaluate_checked(&self, name: &str, t: f64) -> Result<Array1<f64>> {
        let value = self.evaluate(t)?;
        if value.is_empty() {
            return Err(MorError::InvalidValue(format!(
                "parameter '{}' has no components",
                name
            )));
        }
        if value.len() != self.len() {
            return Err(MorError::ShapeMismatch {
                name: name.to_string(),
                expected: self.len(),
                actual: value.len(),
            });
        }
        if value.iter().any(|v| !v.is_finite()) {
            return Err(MorError::InvalidValue(format!(
                "parameter '{}' evaluates to a non-finite value at t = {}",
                name, t
            )));
        }
        Ok(value)
    }
}

impl fmt::Debug for TimeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFunction::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            TimeFunction::Expression(expression) => f
                .debug_tuple("Expression")
                .field(&expression.source())
                .finish(),
            TimeFunction::Custom { len, .. } => {
                f.debug_struct("Custom").field("len", len).finish_non_exhaustive()
            }
        }
    }
}

impl From<Array1<f64>> for TimeFunction {
    fn from(value: Array1<f64>) -> Self {
        TimeFunction::Constant(value)
    }
}

impl From<Vec<f64>> for TimeFunction {
    fn from(value: Vec<f64>) -> Self {
        TimeFunction::Constant(Array1::from(value))
    }
}

impl From<f64> for TimeFunction {
    fn from(value: f64) -> Self {
        TimeFunction::Constant(Array1::from(vec![value]))
    }
}

impl From<CompiledExpression> for TimeFunction {
    fn from(expression: CompiledExpression) -> Self {
        TimeFunction::Expression(expression)
    }
}
