//! Integration tests for the Parametric trait
//!
//! A small affinely decomposed operator `theta(mu) * A` consumes parameter
//! assignments the way reduction algorithms do.

use mor_params::parameters::{Mu, ParameterInput, Parameters, ValueInput};
use mor_params::{MorError, Parametric, Result};
use ndarray::{array, Array1};

struct AffineTerm {
    parameters: Parameters,
    coefficients: Array1<f64>,
}

impl AffineTerm {
    fn new() -> Self {
        Self {
            parameters: Parameters::new([("diffusion", 1), ("source", 2)]).unwrap(),
            coefficients: array![1.0, 2.0, 3.0],
        }
    }

    fn apply(&self, mu: Option<&Mu>) -> Result<Array1<f64>> {
        self.check_mu(mu)?;
        let mu = mu.ok_or_else(|| MorError::MissingParameter("diffusion".to_string()))?;
        let diffusion = mu.value("diffusion")?[0];
        Ok(&self.coefficients * diffusion + mu.value("source")?.sum())
    }
}

impl Parametric for AffineTerm {
    fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

#[test]
fn test_operator_validates_mu() {
    let op = AffineTerm::new();
    assert!(op.is_parametric());

    let mu = op
        .parse_mu(ParameterInput::named([
            ("diffusion", ValueInput::from(2.0)),
            ("source", ValueInput::from(vec![0.5, 0.5])),
        ]))
        .unwrap();
    assert_eq!(op.apply(Some(&mu)).unwrap(), array![3.0, 5.0, 7.0]);

    assert!(matches!(
        op.apply(None),
        Err(MorError::MissingParameter(_))
    ));

    let incompatible = Mu::new([("diffusion", vec![1.0]), ("source", vec![1.0])]).unwrap();
    assert!(matches!(
        op.apply(Some(&incompatible)),
        Err(MorError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_operator_over_time() {
    let op = AffineTerm::new();
    let mu = op
        .parse_mu(ParameterInput::symbolic([("diffusion", "1 + t"), ("source", "[0, t]")]))
        .unwrap();

    let values: Vec<Array1<f64>> = [0.0, 1.0]
        .iter()
        .map(|&t| op.apply(Some(&mu.with_t(t).unwrap())).unwrap())
        .collect();
    assert_eq!(values[0], array![1.0, 2.0, 3.0]);
    assert_eq!(values[1], array![3.0, 5.0, 7.0]);
}

#[test]
fn test_operator_over_sampled_space() {
    let op = AffineTerm::new();
    let space = op.parameters().space((0.0, 1.0)).unwrap();
    for mu in space.sample_uniformly(3).unwrap() {
        let value = op.apply(Some(&mu)).unwrap();
        assert!(value.iter().all(|v| (0.0..=5.0).contains(v)));
    }
}
