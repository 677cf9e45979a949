use thiserror::Error;

use crate::parameters::expression::ExpressionError;

/// Error types for the mor-params library.
#[derive(Error, Debug)]
pub enum MorError {
    /// Two schemas declare the same parameter with different sizes.
    #[error("Schema conflict for parameter '{name}': size {left} vs. size {right}")]
    SchemaConflict {
        name: String,
        left: usize,
        right: usize,
    },

    /// A value's length disagrees with its declared size.
    #[error("Shape mismatch for '{name}': expected {expected} component(s), got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A name that the target schema does not declare.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A declared name that the input does not provide.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// Non-positive sampling interval or malformed time value.
    #[error("Domain error: {0}")]
    DomainError(String),

    /// Operands of an arithmetic operation have different schemas.
    #[error("Incompatible schemas: {left} vs. {right}")]
    IncompatibleSchemas { left: String, right: String },

    /// Non-finite numbers, non-positive sizes and similar invalid values.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Bounds with low > high or non-finite ends.
    #[error("Invalid bounds: [{low}, {high}] must be finite with low <= high")]
    InvalidBounds { low: f64, high: f64 },

    /// Error while compiling or evaluating a time expression.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for mor-params operations.
pub type Result<T> = std::result::Result<T, MorError>;
