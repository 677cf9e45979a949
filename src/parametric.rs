//! Parametric object trait.
//!
//! This module defines the `Parametric` trait, implemented by every object
//! whose behaviour depends on a parameter assignment. Operations on such an
//! object take an optional [`Mu`] and validate it with [`Parametric::check_mu`].

use crate::error::{MorError, Result};
use crate::parameters::{Mu, ParameterInput, Parameters};

/// A trait for objects that depend on parameters.
///
/// # Example
///
/// ```
/// use mor_params::parameters::{Mu, Parameters};
/// use mor_params::Parametric;
///
/// struct Diffusion {
///     parameters: Parameters,
/// }
///
/// impl Parametric for Diffusion {
///     fn parameters(&self) -> &Parameters {
///         &self.parameters
///     }
/// }
///
/// let op = Diffusion {
///     parameters: Parameters::new([("diffusion", 1)]).unwrap(),
/// };
/// assert!(op.is_parametric());
/// assert!(op.check_mu(None).is_err());
/// assert!(op.check_mu(Some(&Mu::new([("diffusion", 0.5)]).unwrap())).is_ok());
/// ```
pub trait Parametric {
    /// The schema of the parameters this object depends on.
    fn parameters(&self) -> &Parameters;

    /// Whether the object depends on any parameter.
    fn is_parametric(&self) -> bool {
        !self.parameters().is_empty()
    }

    /// Validate the `mu` argument of a parameter-dependent operation.
    ///
    /// `None` is only accepted by non-parametric objects. An assignment must
    /// provide every declared parameter with its declared size; further
    /// entries are ignored.
    fn check_mu(&self, mu: Option<&Mu>) -> Result<()> {
        match mu {
            Some(mu) => self.parameters().assert_compatible(mu),
            None => match self.parameters().names().next() {
                Some(name) => Err(MorError::MissingParameter(name.to_string())),
                None => Ok(()),
            },
        }
    }

    /// Parse literal parameter data against [`Parametric::parameters`].
    fn parse_mu(&self, input: impl Into<ParameterInput>) -> Result<Mu>
    where
        Self: Sized,
    {
        self.parameters().parse(input)
    }
}
