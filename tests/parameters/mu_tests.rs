//! Integration tests for parameter assignments
//!
//! These tests verify time-dependent values, copies with changes and the
//! vector-space operations on [`Mu`].

use approx::assert_relative_eq;
use mor_params::parameters::{CompiledExpression, Mu, Parameters, TimeFunction};
use mor_params::MorError;
use ndarray::array;

fn time_dependent() -> Mu {
    let rule = TimeFunction::from(CompiledExpression::compile("[t**2, t[0]]").unwrap());
    Mu::new([("a", TimeFunction::from(7.0)), ("b", rule)]).unwrap()
}

#[test]
fn test_time_dependent_evaluation() {
    let mu = time_dependent();
    assert_eq!(mu.get("b"), Some(&array![0.0, 0.0]));

    let at_three = mu.with_t(3.0).unwrap();
    assert_eq!(at_three.get("a"), Some(&array![7.0]));
    assert_eq!(at_three.get("b"), Some(&array![9.0, 3.0]));
    assert!(at_three.is_time_dependent("b"));
    assert!(!at_three.is_time_dependent("a"));

    // The rule is kept, so the value follows t
    let rule = at_three.get_time_dependent_value("b").unwrap();
    assert_eq!(rule.evaluate(2.0).unwrap(), array![4.0, 2.0]);
}

#[test]
fn test_static_entry_as_constant_rule() {
    let mu = time_dependent();
    let rule = mu.get_time_dependent_value("a").unwrap();
    assert!(rule.is_constant());
    for t in [-1.0, 0.0, 10.0] {
        assert_eq!(&rule.evaluate(t).unwrap(), mu.get("a").unwrap());
    }
    assert!(mu.get_time_dependent_value("missing").is_none());
}

#[test]
fn test_custom_time_function() {
    let rule = TimeFunction::custom(1, |t| array![(-t).exp()]);
    let mu = Mu::new([("decay", rule)]).unwrap().with_t(1.0).unwrap();
    assert_relative_eq!(mu.get("decay").unwrap()[0], (-1.0f64).exp());
    assert!(mu.has_time_dependence());

    let wrong_length = TimeFunction::custom(2, |t| array![t]);
    assert!(matches!(
        Mu::new([("x", wrong_length)]),
        Err(MorError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_with_changes_keeps_rules() {
    let mu = time_dependent();
    let changed = mu.with_changes(Some(2.0), [("a", vec![1.0])]).unwrap();
    assert_eq!(changed.get("a"), Some(&array![1.0]));
    assert_eq!(changed.get("b"), Some(&array![4.0, 2.0]));
    assert!(changed.is_time_dependent("b"));

    // The original is unchanged
    assert_eq!(mu.get("a"), Some(&array![7.0]));
    assert_eq!(mu.t(), 0.0);
}

#[test]
fn test_flatten_includes_time_in_order() {
    let mu = Mu::new([("alpha", vec![1.0]), ("zeta", vec![2.0, 3.0]), ("t", vec![0.5])]).unwrap();
    assert_eq!(mu.t(), 0.5);
    assert_eq!(mu.to_array(), array![1.0, 2.0, 3.0]);
    assert_eq!(mu.flatten(true), array![1.0, 0.5, 2.0, 3.0]);
    assert_eq!(mu.flatten(false), mu.to_array());
}

#[test]
fn test_time_must_be_scalar() {
    assert!(matches!(
        Mu::new([("t", vec![1.0, 2.0])]),
        Err(MorError::DomainError(_))
    ));
}

#[test]
fn test_algebra() {
    let x = Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.0])]).unwrap();
    let y = Mu::new([("a", vec![0.5]), ("b", vec![-1.0, 1.0])]).unwrap();

    let sum = (&x + &y).unwrap();
    assert_eq!(sum, Mu::new([("a", vec![1.5]), ("b", vec![1.0, 4.0])]).unwrap());
    assert_eq!(sum, (y.clone() + x.clone()).unwrap());

    let diff = (&x - &y).unwrap();
    assert_eq!(diff, Mu::new([("a", vec![0.5]), ("b", vec![3.0, 2.0])]).unwrap());
    assert_eq!((&diff + &y).unwrap(), x);

    assert_eq!(-&x, Mu::new([("a", vec![-1.0]), ("b", vec![-2.0, -3.0])]).unwrap());
    assert_eq!(-(-x.clone()), x);
    assert_eq!((&x * 2.0).unwrap(), (&x + &x).unwrap());
    assert_eq!((0.0 * &x).unwrap(), (&x - &x).unwrap());

    let shifted = (&x + &array![1.0, 1.0, 1.0]).unwrap();
    assert_eq!(shifted.to_array(), array![2.0, 3.0, 4.0]);
    assert_eq!((&shifted - &array![1.0, 1.0, 1.0]).unwrap(), x);
}

#[test]
fn test_algebra_of_time_dependent_values() {
    let mu = time_dependent().with_t(3.0).unwrap();
    let doubled = (&mu + &mu).unwrap();
    assert_eq!(doubled.get("b"), Some(&array![18.0, 6.0]));
    assert_eq!(doubled.t(), 3.0);

    // Results hold the current values and no longer follow t
    assert!(!doubled.has_time_dependence());
    let later = doubled.with_t(4.0).unwrap();
    assert_eq!(later.get("b"), Some(&array![18.0, 6.0]));
}

#[test]
fn test_algebra_schema_mismatch() {
    let x = Mu::new([("a", vec![1.0])]).unwrap();
    let y = Mu::new([("b", vec![1.0])]).unwrap();
    let z = Mu::new([("a", vec![1.0, 2.0])]).unwrap();

    assert!(matches!(&x + &y, Err(MorError::IncompatibleSchemas { .. })));
    assert!(matches!(&x - &z, Err(MorError::IncompatibleSchemas { .. })));
    assert!(matches!(
        &x + &array![1.0, 2.0],
        Err(MorError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_algebra_rejects_overflow() {
    let large = Mu::new([("a", vec![1e308]), ("b", vec![1.0, -1e308])]).unwrap();

    assert!(matches!(&large * 10.0, Err(MorError::InvalidValue(_))));
    assert!(matches!(10.0 * &large, Err(MorError::InvalidValue(_))));
    assert!(matches!(&large * f64::NAN, Err(MorError::InvalidValue(_))));
    assert!(matches!(&large + &large, Err(MorError::InvalidValue(_))));
    assert!(matches!(
        &large - &(-&large),
        Err(MorError::InvalidValue(_))
    ));
    assert!(matches!(
        &large + &array![1e308, 0.0, 0.0],
        Err(MorError::InvalidValue(_))
    ));

    let halved = (&large * 0.5).unwrap();
    assert_eq!(halved.to_array(), array![5e307, 0.5, -5e307]);
}

#[test]
fn test_names_are_validated() {
    assert!(matches!(
        Mu::new([("", vec![1.0])]),
        Err(MorError::InvalidValue(_))
    ));

    let mu = Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.0])]).unwrap();
    let schema = mu.parameters();
    assert_eq!(Parameters::from_json(&schema.to_json().unwrap()).unwrap(), schema);
}

#[test]
fn test_equality() {
    let x = Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.0])]).unwrap();
    let reordered = Mu::new([("b", vec![2.0, 3.0]), ("a", vec![1.0])]).unwrap();
    assert_eq!(x, reordered);
    assert_eq!(x, x.with_t(5.0).unwrap());
    assert_ne!(x, Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.5])]).unwrap());
    assert_ne!(x, Mu::new([("a", vec![1.0])]).unwrap());
}

#[test]
fn test_display() {
    let mu = Mu::new([("a", vec![1.5]), ("b", vec![2.0, 3.0]), ("t", vec![1.0])]).unwrap();
    assert_eq!(mu.to_string(), "{a: [1.5], b: [2, 3], t: 1}");
}
