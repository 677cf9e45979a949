//! # Parameter System
//!
//! Named, possibly vector-valued and possibly time-dependent parameters,
//! the assignments of values to them, and bounded spaces to sample them from.
//!
//! ## Core Components
//!
//! - [`Parameters`]: the schema of a parametric object, mapping names to sizes
//! - [`Mu`]: an immutable assignment of values, evaluated at a time `t`
//! - [`TimeFunction`] and [`CompiledExpression`]: time-dependent values such as `"t**2"`
//! - [`ParameterInput`]: the literal forms accepted by [`Parameters::parse`]
//! - [`ParameterSpace`]: a schema with an interval per parameter
//! - [`UniformSamples`]: the lazy grid produced by [`ParameterSpace::sample_uniformly`]
//!
//! ## Example Usage
//!
//! ```rust
//! use mor_params::parameters::{Literal, ParameterInput, Parameters};
//!
//! // A schema with a scalar and a two-component parameter
//! let params = Parameters::new([("a", 1), ("b", 2)]).unwrap();
//!
//! // Flat input is distributed over the names in ascending order
//! let input = ParameterInput::Flat(vec![
//!     Literal::from(7.0),
//!     Literal::from("t**2"),
//!     Literal::from("t[0]"),
//! ]);
//! let mu = params.parse(input).unwrap().with_t(3.0).unwrap();
//! assert_eq!(mu.get("a").unwrap().to_vec(), vec![7.0]);
//! assert_eq!(mu.get("b").unwrap().to_vec(), vec![9.0, 3.0]);
//!
//! // Sample a space over the schema
//! let space = params.space((0.1, 1.0)).unwrap();
//! assert_eq!(space.sample_uniformly(10).unwrap().count(), 1000);
//! assert!(space.sample_randomly(5).iter().all(|mu| space.contains(mu)));
//! ```

pub mod bounds;
pub mod expression;
pub mod functions;
pub mod mu;
pub mod parameters;
pub mod parser;
pub mod sampler;
pub mod space;


// Re-export key types
pub use bounds::Bounds;
pub use expression::{CompiledExpression, Expression, ExpressionError};
pub use functions::TimeFunction;
pub use mu::Mu;
pub use parameters::Parameters;
pub use parser::{Literal, ParameterInput, ParseOptions, ValueInput};
pub use sampler::{GridCounts, SamplingConfig, UniformSamples};
pub use space::{ParameterRanges, ParameterSpace};
