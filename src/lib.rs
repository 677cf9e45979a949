//! # mor-params
//!
//! `mor-params` is the parameter model of a parametric model-order-reduction
//! toolkit: named, possibly vector-valued and time-dependent parameters,
//! immutable value assignments, and bounded parameter spaces with sampling.
//!
//! The library provides:
//! - A parameter schema ([`Parameters`]) with union and compatibility checks
//! - Parameter assignments ([`Mu`]) with time-dependent values and vector-space arithmetic
//! - A parser for numbers, sequences and symbolic time expressions such as `"t**2"`
//! - Parameter spaces with uniform, random and logarithmic sampling
//!
//! ## Basic Usage
//!
//! ```
//! use mor_params::{Mu, Parameters};
//!
//! let params = Parameters::new([("diffusion", 2), ("reaction", 1)]).unwrap();
//! let space = params.space((0.1, 1.0)).unwrap();
//!
//! let mu = space.clip(&params.parse(vec![0.5, 2.0, -1.0]).unwrap(), false);
//! assert_eq!(mu.to_array().to_vec(), vec![0.5, 1.0, 0.1]);
//!
//! let shifted: Mu = (&mu + &mu).unwrap();
//! assert!(!space.contains(&shifted));
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

pub mod parametric;

// Re-exports for convenience
pub use error::{MorError, Result};
pub use parameters::{Mu, ParameterSpace, Parameters};
pub use parametric::Parametric;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
