//! Conversion of literal parameter data into [`Mu`] values
//!
//! Inputs are explicit variants rather than loosely typed values:
//!
//! - [`ParameterInput::Flat`]: one literal per scalar component, laid out in
//!   ascending name order (the inverse of [`Mu::to_array`])
//! - [`ParameterInput::Named`]: a value per parameter name
//! - [`ParameterInput::NamedSymbolic`]: an expression string per parameter name
//! - [`ParameterInput::Assignment`]: an existing [`Mu`] to be checked
//!
//! Any literal may be an expression of `t`; such components make the
//! parameter time-dependent.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::error::{MorError, Result};
use crate::parameters::expression::{CompiledExpression, Expression, TIME_VARIABLE};
use crate::parameters::functions::TimeFunction;
use crate::parameters::mu::Mu;
use crate::parameters::parameters::Parameters;

/// A single component: a number or an expression of `t`
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Expression(String),
}

/// The value given for one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput {
    /// A single literal; an expression may itself be a bracketed vector
    Scalar(Literal),

    /// One literal per component
    Sequence(Vec<Literal>),
}

/// Literal parameter data accepted by [`Parameters::parse`]
#[derive(Debug, Clone)]
pub enum ParameterInput {
    Flat(Vec<Literal>),
    Named(BTreeMap<String, ValueInput>),
    NamedSymbolic(BTreeMap<String, String>),
    Assignment(Mu),
}

impl ParameterInput {
    /// Build a [`ParameterInput::Named`] from `(name, value)` pairs
    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ValueInput>,
    {
        ParameterInput::Named(
            values
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Build a [`ParameterInput::NamedSymbolic`] from `(name, expression)` pairs
    pub fn symbolic<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ParameterInput::NamedSymbolic(
            values
                .into_iter()
                .map(|(name, expression)| (name.into(), expression.into()))
                .collect(),
        )
    }
}

/// Options controlling [`Parameters::parse_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fill every component of a multi-component parameter from a single
    /// scalar. Default: false
    pub broadcast_scalars: bool,
}

impl ParseOptions {
    /// Options with scalar broadcasting switched on or off
    pub fn with_broadcast(mut self, broadcast: bool) -> Self {
        self.broadcast_scalars = broadcast;
        self
    }
}

/// Parse `input` against `schema`.
pub(crate) fn parse(schema: &Parameters, input: ParameterInput, options: &ParseOptions) -> Result<Mu> {
    match input {
        ParameterInput::Flat(literals) => parse_flat(schema, &literals),
        ParameterInput::Named(values) => parse_named(schema, values, options),
        ParameterInput::NamedSymbolic(expressions) => {
            let values = expressions
                .into_iter()
                .map(|(name, source)| (name, ValueInput::Scalar(Literal::Expression(source))))
                .collect();
            parse_named(schema, values, options)
        }
        ParameterInput::Assignment(mu) => check_assignment(schema, mu),
    }
}

fn parse_flat(schema: &Parameters, literals: &[Literal]) -> Result<Mu> {
    if literals.len() != schema.dim() {
        return Err(MorError::ShapeMismatch {
            name: "<flattened>".to_string(),
            expected: schema.dim(),
            actual: literals.len(),
        });
    }

    let mut offset = 0;
    let mut rules = BTreeMap::new();
    for (name, size) in schema.iter() {
        let rule = rule_from_literals(name, &literals[offset..offset + size])?;
        rules.insert(name.to_string(), rule);
        offset += size;
    }
    Mu::from_rules(rules, 0.0)
}

fn parse_named(
    schema: &Parameters,
    mut values: BTreeMap<String, ValueInput>,
    options: &ParseOptions,
) -> Result<Mu> {
    let t = match values.remove(TIME_VARIABLE) {
        Some(value) => parse_time(value)?,
        None => 0.0,
    };

    if let Some(unknown) = values.keys().find(|name| !schema.contains(name)) {
        return Err(MorError::UnknownParameter(unknown.clone()));
    }

    let mut rules = BTreeMap::new();
    for (name, size) in schema.iter() {
        let value = values
            .remove(name)
            .ok_or_else(|| MorError::MissingParameter(name.to_string()))?;
        rules.insert(name.to_string(), rule_from_value(name, size, value, options)?);
    }
    Mu::from_rules(rules, t)
}

fn check_assignment(schema: &Parameters, mu: Mu) -> Result<Mu> {
    schema.assert_compatible(&mu)?;
    let extra = mu
        .names()
        .find(|name| !schema.contains(name))
        .or_else(|| mu.additional().keys().next().map(String::as_str));
    if let Some(name) = extra {
        return Err(MorError::UnknownParameter(name.to_string()));
    }
    Ok(mu)
}

fn parse_time(value: ValueInput) -> Result<f64> {
    let literal = match value {
        ValueInput::Scalar(literal) => literal,
        ValueInput::Sequence(mut literals) if literals.len() == 1 => literals.remove(0),
        ValueInput::Sequence(literals) => {
            return Err(MorError::DomainError(format!(
                "time must be a scalar, got {} components",
                literals.len()
            )))
        }
    };

    let t = match literal {
        Literal::Number(t) => t,
        Literal::Expression(source) => {
            let expression = CompiledExpression::compile(&source)?;
            if expression.references_time() || expression.len() != 1 {
                return Err(MorError::DomainError(format!(
                    "time must be a constant scalar, got '{}'",
                    source
                )));
            }
            expression.evaluate(0.0)?[0]
        }
    };
    if !t.is_finite() {
        return Err(MorError::DomainError(format!("time must be finite, got {}", t)));
    }
    Ok(t)
}

fn rule_from_value(
    name: &str,
    size: usize,
    value: ValueInput,
    options: &ParseOptions,
) -> Result<TimeFunction> {
    match value {
        ValueInput::Sequence(literals) => {
            if literals.len() != size {
                return Err(MorError::ShapeMismatch {
                    name: name.to_string(),
                    expected: size,
                    actual: literals.len(),
                });
            }
            rule_from_literals(name, &literals)
        }
        ValueInput::Scalar(Literal::Number(x)) => {
            if size == 1 || options.broadcast_scalars {
                Ok(TimeFunction::Constant(Array1::from_elem(size, x)))
            } else {
                Err(MorError::ShapeMismatch {
                    name: name.to_string(),
                    expected: size,
                    actual: 1,
                })
            }
        }
        ValueInput::Scalar(Literal::Expression(source)) => {
            let expression = CompiledExpression::compile(&source)?;
            let expression = if expression.len() == size {
                expression
            } else if expression.len() == 1 && options.broadcast_scalars {
                CompiledExpression::from_expressions(vec![expression.components()[0].clone(); size])?
            } else {
                return Err(MorError::ShapeMismatch {
                    name: name.to_string(),
                    expected: size,
                    actual: expression.len(),
                });
            };
            TimeFunction::from_expression(expression)
        }
    }
}

/// Combine per-component literals into one rule for parameter `name`.
fn rule_from_literals(name: &str, literals: &[Literal]) -> Result<TimeFunction> {
    let numbers: Option<Vec<f64>> = literals
        .iter()
        .map(|literal| match literal {
            Literal::Number(x) => Some(*x),
            Literal::Expression(_) => None,
        })
        .collect();
    if let Some(numbers) = numbers {
        return Ok(TimeFunction::Constant(Array1::from(numbers)));
    }

    let mut components = Vec::with_capacity(literals.len());
    for literal in literals {
        match literal {
            Literal::Number(x) => components.push(Expression::Number(*x)),
            Literal::Expression(source) => {
                let expression = CompiledExpression::compile(source)?;
                if expression.len() != 1 {
                    return Err(MorError::ShapeMismatch {
                        name: name.to_string(),
                        expected: 1,
                        actual: expression.len(),
                    });
                }
                components.extend(expression.components().iter().cloned());
            }
        }
    }
    TimeFunction::from_expression(CompiledExpression::from_expressions(components)?)
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Number(f64::from(value))
    }
}

impl From<&str> for Literal {
    fn from(source: &str) -> Self {
        Literal::Expression(source.to_string())
    }
}

impl From<String> for Literal {
    fn from(source: String) -> Self {
        Literal::Expression(source)
    }
}

impl From<Literal> for ValueInput {
    fn from(literal: Literal) -> Self {
        ValueInput::Scalar(literal)
    }
}

impl From<f64> for ValueInput {
    fn from(value: f64) -> Self {
        ValueInput::Scalar(Literal::Number(value))
    }
}

impl From<&str> for ValueInput {
    fn from(source: &str) -> Self {
        ValueInput::Scalar(Literal::from(source))
    }
}

impl From<Vec<f64>> for ValueInput {
    fn from(values: Vec<f64>) -> Self {
        ValueInput::Sequence(values.into_iter().map(Literal::Number).collect())
    }
}

impl From<Vec<&str>> for ValueInput {
    fn from(sources: Vec<&str>) -> Self {
        ValueInput::Sequence(sources.into_iter().map(Literal::from).collect())
    }
}

impl From<Vec<Literal>> for ValueInput {
    fn from(literals: Vec<Literal>) -> Self {
        ValueInput::Sequence(literals)
    }
}

impl From<&Array1<f64>> for ValueInput {
    fn from(values: &Array1<f64>) -> Self {
        ValueInput::Sequence(values.iter().copied().map(Literal::Number).collect())
    }
}

impl From<Vec<f64>> for ParameterInput {
    fn from(values: Vec<f64>) -> Self {
        ParameterInput::Flat(values.into_iter().map(Literal::Number).collect())
    }
}

impl From<&[f64]> for ParameterInput {
    fn from(values: &[f64]) -> Self {
        ParameterInput::Flat(values.iter().copied().map(Literal::Number).collect())
    }
}

impl From<Array1<f64>> for ParameterInput {
    fn from(values: Array1<f64>) -> Self {
        ParameterInput::Flat(values.into_iter().map(Literal::Number).collect())
    }
}

impl From<&Array1<f64>> for ParameterInput {
    fn from(values: &Array1<f64>) -> Self {
        ParameterInput::Flat(values.iter().copied().map(Literal::Number).collect())
    }
}

impl From<Vec<Literal>> for ParameterInput {
    fn from(literals: Vec<Literal>) -> Self {
        ParameterInput::Flat(literals)
    }
}

impl From<Mu> for ParameterInput {
    fn from(mu: Mu) -> Self {
        ParameterInput::Assignment(mu)
    }
}

impl From<&Mu> for ParameterInput {
    fn from(mu: &Mu) -> Self {
        ParameterInput::Assignment(mu.clone())
    }
}
