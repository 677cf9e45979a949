//! Expression parsing and evaluation for time-dependent parameter values
//!
//! A parameter component may be given as a string such as `"t**2"` or
//! `"sin(t[0]) + 1"`. This module compiles such strings into a small AST
//! whose only free variable is the scalar time `t`.

use ndarray::Array1;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::pair,
    IResult, Parser,
};
use std::fmt;
use thiserror::Error;
use tracing::trace;

/// Name of the only variable an expression may reference.
pub const TIME_VARIABLE: &str = "t";

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Invalid index {index} for variable '{name}'")]
    InvalidIndex { name: String, index: usize },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

/// Result type for expression evaluation
type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Variable reference
    Variable(String),

    /// Indexed variable reference, e.g. `t[0]`
    Index(String, usize),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,

    /// Power (`^` or `**`)
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

impl Expression {
    /// Parse a scalar expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input) {
            Ok((remainder, expr)) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression at time `t`
    pub fn evaluate(&self, t: f64) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => {
                if name == TIME_VARIABLE {
                    Ok(t)
                } else {
                    Err(ExpressionError::UndefinedVariable { name: name.clone() })
                }
            }

            Self::Index(name, index) => {
                check_index(name, *index)?;
                Ok(t)
            }

            Self::Unary(op, expr) => {
                let value = expr.evaluate(t)?;
                match op {
                    UnaryOp::Neg => Ok(-value),
                }
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(t)?;
                let rhs = right.evaluate(t)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let evaluated_args = args
                    .iter()
                    .map(|arg| arg.evaluate(t))
                    .collect::<ExprResult<Vec<_>>>()?;
                apply_function(name, &evaluated_args)
            }
        }
    }

    /// Check that the expression only uses `t`, `t[0]` and known functions
    pub fn validate(&self) -> ExprResult<()> {
        match self {
            Self::Number(_) => Ok(()),
            Self::Variable(name) => {
                if name == TIME_VARIABLE {
                    Ok(())
                } else {
                    Err(ExpressionError::UndefinedVariable { name: name.clone() })
                }
            }
            Self::Index(name, index) => check_index(name, *index),
            Self::Unary(_, expr) => expr.validate(),
            Self::Binary(_, left, right) => {
                left.validate()?;
                right.validate()
            }
            Self::Function(name, args) => {
                check_arity(name, args.len())?;
                args.iter().try_for_each(Expression::validate)
            }
        }
    }

    /// Find all variable names used in the expression
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// Whether the expression depends on `t`
    pub fn references_time(&self) -> bool {
        self.variables().iter().any(|name| name == TIME_VARIABLE)
    }

    /// Recursively collect all variable names used in the expression
    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}

            Self::Variable(name) | Self::Index(name, _) => {
                vars.push(name.clone());
            }

            Self::Unary(_, expr) => {
                expr.collect_variables(vars);
            }

            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }

            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Variable(name) => write!(f, "{}", name),
            Self::Index(name, index) => write!(f, "{}[{}]", name, index),
            Self::Unary(UnaryOp::Neg, expr) => write!(f, "-({})", expr),
            Self::Binary(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
            Self::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A vector-valued rule `t -> [e_0(t), ..., e_{n-1}(t)]`.
///
/// Compiled either from a single expression (one component) or from a
/// bracketed list such as `"[t**2, t[0]]"`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    components: Vec<Expression>,
}

impl CompiledExpression {
    /// Compile a source string into a validated rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use mor_params::parameters::expression::CompiledExpression;
    ///
    /// let rule = CompiledExpression::compile("[t**2, t[0]]").unwrap();
    /// assert_eq!(rule.len(), 2);
    /// assert_eq!(rule.evaluate(3.0).unwrap().to_vec(), vec![9.0, 3.0]);
    /// ```
    pub fn compile(source: &str) -> ExprResult<Self> {
        let components = match vector_parser(source) {
            Ok((remainder, items)) if remainder.trim().is_empty() => items,
            Ok((remainder, _)) => {
                return Err(ExpressionError::ParseError {
                    message: format!("Unexpected trailing characters: '{}'", remainder),
                })
            }
            Err(_) => vec![Expression::parse(source)?],
        };

        for component in &components {
            component.validate()?;
        }

        let compiled = Self {
            source: source.trim().to_string(),
            components,
        };
        trace!(
            source = %compiled.source,
            components = compiled.len(),
            time_dependent = compiled.references_time(),
            "expression compiled"
        );
        Ok(compiled)
    }

    /// Build a rule from already parsed component expressions.
    pub fn from_expressions(components: Vec<Expression>) -> ExprResult<Self> {
        for component in &components {
            component.validate()?;
        }
        let source = match components.as_slice() {
            [single] => single.to_string(),
            _ => format!(
                "[{}]",
                components
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        Ok(Self { source, components })
    }

    /// The source text of the rule
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The component expressions
    pub fn components(&self) -> &[Expression] {
        &self.components
    }

    /// Number of components produced per evaluation
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the rule has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether any component depends on `t`
    pub fn references_time(&self) -> bool {
        self.components.iter().any(Expression::references_time)
    }

    /// Evaluate all components at time `t`
    pub fn evaluate(&self, t: f64) -> ExprResult<Array1<f64>> {
        self.components
            .iter()
            .map(|c| c.evaluate(t))
            .collect::<ExprResult<Vec<_>>>()
            .map(Array1::from)
    }
}

fn check_index(name: &str, index: usize) -> ExprResult<()> {
    if name != TIME_VARIABLE {
        return Err(ExpressionError::UndefinedVariable {
            name: name.to_string(),
        });
    }
    // `t` is a one-element vector
    if index != 0 {
        return Err(ExpressionError::InvalidIndex {
            name: name.to_string(),
            index,
        });
    }
    Ok(())
}

fn check_arity(name: &str, count: usize) -> ExprResult<()> {
    match name {
        "sin" | "cos" | "tan" | "exp" | "log" | "ln" | "log10" | "sqrt" | "abs" => {
            if count != 1 {
                return Err(ExpressionError::InvalidOperation {
                    message: format!("{}() requires 1 argument, got {}", name, count),
                });
            }
            Ok(())
        }
        "max" | "min" => {
            if count < 2 {
                return Err(ExpressionError::InvalidOperation {
                    message: format!("{}() requires at least 2 arguments, got {}", name, count),
                });
            }
            Ok(())
        }
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

fn apply_function(name: &str, args: &[f64]) -> ExprResult<f64> {
    check_arity(name, args.len())?;
    let value = match name {
        "sin" => args[0].sin(),
        "cos" => args[0].cos(),
        "tan" => args[0].tan(),
        "exp" => args[0].exp(),
        "log" | "ln" => args[0].ln(),
        "log10" => args[0].log10(),
        "sqrt" => args[0].sqrt(),
        "abs" => args[0].abs(),
        "max" => args.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        "min" => args.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
        _ => {
            return Err(ExpressionError::UndefinedFunction {
                name: name.to_string(),
            })
        }
    };
    Ok(value)
}

// Parser functions using nom

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

fn symbol(input: &str, c: char) -> IResult<&str, char> {
    let (input, _) = ws(input)?;
    char(c).parse(input)
}

fn parse_failure(input: &str, kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

/// Parse an identifier (variable or function name)
fn identifier(input: &str) -> IResult<&str, String> {
    let (input, _) = ws(input)?;
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
    .map(|(rest, matched): (&str, &str)| (rest, matched.to_string()))
}

/// Parse a comma-separated list of expressions
fn args_list(input: &str) -> IResult<&str, Vec<Expression>> {
    let (mut remainder, first) = expr_parser(input)?;
    let mut res = vec![first];

    while let Ok((after_comma, _)) = symbol(remainder, ',') {
        let (after_expr, expr) = expr_parser(after_comma)?;
        res.push(expr);
        remainder = after_expr;
    }

    Ok((remainder, res))
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = symbol(input, '(')?;

    // Handle empty arguments case
    if let Ok((input, _)) = symbol(input, ')') {
        return Ok((input, Expression::Function(name, vec![])));
    }

    let (input, args) = args_list(input)?;
    let (input, _) = symbol(input, ')')?;

    Ok((input, Expression::Function(name, args)))
}

/// Parse an unsigned number; signs are handled by `unary`
fn number(input: &str) -> IResult<&str, Expression> {
    let (input, _) = ws(input)?;
    if !input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(parse_failure(input, nom::error::ErrorKind::Float));
    }
    let (input, num) = double::<&str, nom::error::Error<&str>>(input)?;
    Ok((input, Expression::Number(num)))
}

/// Parse an indexed variable reference such as `t[0]`
fn indexed_variable(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = symbol(input, '[')?;
    let (input, _) = ws(input)?;
    let (rest, digits) = digit1::<&str, nom::error::Error<&str>>(input)?;
    let index = digits
        .parse::<usize>()
        .map_err(|_| parse_failure(input, nom::error::ErrorKind::Digit))?;
    let (rest, _) = symbol(rest, ']')?;
    Ok((rest, Expression::Index(name, index)))
}

/// Parse a variable reference
fn variable(input: &str) -> IResult<&str, Expression> {
    let (input, var_name) = identifier(input)?;
    Ok((input, Expression::Variable(var_name)))
}

/// Parse a parenthesized expression
fn parens(input: &str) -> IResult<&str, Expression> {
    let (input, _) = symbol(input, '(')?;
    let (input, expr) = expr_parser(input)?;
    let (input, _) = symbol(input, ')')?;
    Ok((input, expr))
}

/// Parse a primary expression (number, function call, variable or parenthesized expression)
fn primary(input: &str) -> IResult<&str, Expression> {
    if let Ok(result) = number(input) {
        return Ok(result);
    }

    if let Ok(result) = function_call(input) {
        return Ok(result);
    }

    if let Ok(result) = indexed_variable(input) {
        return Ok(result);
    }

    if let Ok(result) = variable(input) {
        return Ok(result);
    }

    parens(input)
}

fn power_operator(input: &str) -> IResult<&str, &str> {
    let (input, _) = ws(input)?;
    alt((tag("**"), tag("^"))).parse(input)
}

/// Parse a power expression; right-associative, binds tighter than unary minus
fn power(input: &str) -> IResult<&str, Expression> {
    let (input, base) = primary(input)?;

    match power_operator(input) {
        Ok((after_op, _)) => {
            let (after_exponent, exponent) = unary(after_op)?;
            Ok((
                after_exponent,
                Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

/// Parse a unary expression (-expr, +expr)
fn unary(input: &str) -> IResult<&str, Expression> {
    if let Ok((rest, _)) = symbol(input, '-') {
        let (rest, operand) = unary(rest)?;
        return Ok((rest, Expression::Unary(UnaryOp::Neg, Box::new(operand))));
    }
    if let Ok((rest, _)) = symbol(input, '+') {
        return unary(rest);
    }
    power(input)
}

fn multiplicative_operator(input: &str) -> IResult<&str, BinaryOp> {
    let (input, _) = ws(input)?;
    if input.starts_with("**") {
        return Err(parse_failure(input, nom::error::ErrorKind::Char));
    }
    alt((char('*'), char('/')))
        .parse(input)
        .map(|(rest, op)| (rest, if op == '*' { BinaryOp::Mul } else { BinaryOp::Div }))
}

fn additive_operator(input: &str) -> IResult<&str, BinaryOp> {
    let (input, _) = ws(input)?;
    alt((char('+'), char('-')))
        .parse(input)
        .map(|(rest, op)| (rest, if op == '+' { BinaryOp::Add } else { BinaryOp::Sub }))
}

/// Parse a multiplicative expression (expr * expr, expr / expr), left-associative
fn term(input: &str) -> IResult<&str, Expression> {
    let (mut input, mut left) = unary(input)?;

    while let Ok((after_op, op)) = multiplicative_operator(input) {
        let (remaining, right) = unary(after_op)?;
        left = Expression::Binary(op, Box::new(left), Box::new(right));
        input = remaining;
    }

    Ok((input, left))
}

/// Parse an additive expression (expr + expr, expr - expr), left-associative
fn expr_parser(input: &str) -> IResult<&str, Expression> {
    let (mut input, mut left) = term(input)?;

    while let Ok((after_op, op)) = additive_operator(input) {
        let (remaining, right) = term(after_op)?;
        left = Expression::Binary(op, Box::new(left), Box::new(right));
        input = remaining;
    }

    Ok((input, left))
}

/// Parse a bracketed list of expressions, e.g. `[t, 2 * t]`
fn vector_parser(input: &str) -> IResult<&str, Vec<Expression>> {
    let (input, _) = symbol(input, '[')?;
    let (input, items) = args_list(input)?;
    let (input, _) = symbol(input, ']')?;
    Ok((input, items))
}
