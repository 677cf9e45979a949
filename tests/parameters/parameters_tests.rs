//! Integration tests for the Parameters schema
//!
//! These tests verify schema construction, merging and compatibility checks.

use mor_params::parameters::{Mu, Parameters};
use mor_params::MorError;

#[test]
fn test_schema_basic_operations() {
    let params = Parameters::new([("diffusion", 2), ("advection", 1)]).unwrap();

    assert_eq!(params.len(), 2);
    assert!(!params.is_empty());
    assert!(params.contains("diffusion"));
    assert!(!params.contains("reaction"));
    assert_eq!(params.get("diffusion"), Some(2));
    assert_eq!(params.dim(), 3);

    // Names are always sorted
    let names: Vec<&str> = params.names().collect();
    assert_eq!(names, vec!["advection", "diffusion"]);

    let pairs: Vec<(&str, usize)> = params.iter().collect();
    assert_eq!(pairs, vec![("advection", 1), ("diffusion", 2)]);
}

#[test]
fn test_schema_union_of_operators() {
    // Operators combined into a model expose the union of their schemas
    let stiffness = Parameters::new([("diffusion", 2)]).unwrap();
    let mass = Parameters::empty();
    let convection = Parameters::new([("velocity", 2), ("diffusion", 2)]).unwrap();

    let model = Parameters::of([&stiffness, &mass, &convection]).unwrap();
    assert_eq!(
        model,
        Parameters::new([("diffusion", 2), ("velocity", 2)]).unwrap()
    );
    assert!(stiffness.is_subset_of(&model));
    assert!(mass.is_subset_of(&model));

    let conflicting = Parameters::new([("diffusion", 1)]).unwrap();
    assert!(matches!(
        Parameters::of([&model, &conflicting]),
        Err(MorError::SchemaConflict { .. })
    ));

    // Schema union is commutative
    assert_eq!(
        stiffness.union(&convection).unwrap(),
        convection.union(&stiffness).unwrap()
    );
}

#[test]
fn test_schema_difference() {
    let model = Parameters::new([("a", 1), ("b", 2), ("c", 3)]).unwrap();
    let fixed = Parameters::new([("b", 2)]).unwrap();

    let free = &model - &fixed;
    assert_eq!(free, Parameters::new([("a", 1), ("c", 3)]).unwrap());
    assert_eq!(free.dim(), 4);
    assert_eq!(&model - &Parameters::empty(), model);
}

#[test]
fn test_compatibility() {
    let params = Parameters::new([("a", 1), ("b", 2)]).unwrap();

    let exact = Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.0])]).unwrap();
    assert!(params.is_compatible(&exact));
    assert!(params.why_incompatible(&exact).is_none());

    // Extra names do not matter
    let extra = Mu::new([("a", vec![1.0]), ("b", vec![2.0, 3.0]), ("c", vec![4.0])]).unwrap();
    assert!(params.is_compatible(&extra));

    let missing = Mu::new([("a", vec![1.0])]).unwrap();
    assert!(!params.is_compatible(&missing));
    let reason = params.why_incompatible(&missing).unwrap();
    assert!(reason.contains("b"), "unexpected reason: {}", reason);

    let wrong_shape = Mu::new([("a", vec![1.0, 2.0]), ("b", vec![2.0, 3.0])]).unwrap();
    assert!(matches!(
        params.assert_compatible(&wrong_shape),
        Err(MorError::ShapeMismatch { expected: 1, actual: 2, .. })
    ));

    // Every assignment is compatible with the empty schema
    assert!(Parameters::empty().is_compatible(&exact));
    assert!(Parameters::empty().is_compatible(&Mu::default()));
}

#[test]
fn test_schema_of_assignment() {
    let mu = Mu::new([("b", vec![1.0, 2.0]), ("a", vec![0.0])]).unwrap();
    let params = mu.parameters();
    assert_eq!(params, Parameters::new([("a", 1), ("b", 2)]).unwrap());
    assert!(params.is_compatible(&mu));
}

#[test]
fn test_schema_serialization() {
    let params = Parameters::new([("diffusion", 2), ("advection", 1)]).unwrap();

    let json = params.to_json().unwrap();
    assert_eq!(json, r#"{"advection":1,"diffusion":2}"#);
    assert_eq!(Parameters::from_json(&json).unwrap(), params);

    // Deserialization applies the same validation as construction
    assert!(Parameters::from_json(r#"{"t": 1}"#).is_err());
    assert!(Parameters::from_json(r#"{"a": 0}"#).is_err());
    assert!(matches!(
        Parameters::from_json("not json"),
        Err(MorError::Json(_))
    ));
}
