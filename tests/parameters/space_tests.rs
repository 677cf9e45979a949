//! Integration tests for parameter spaces and sampling
//!
//! These tests verify containment, clipping and the cardinality and bounds of
//! every sampling strategy over a set of space fixtures.

use mor_params::parameters::{
    GridCounts, Mu, ParameterRanges, ParameterSpace, Parameters, SamplingConfig,
};
use mor_params::MorError;
use ndarray::array;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::{array_approx_eq, space_fixtures};

const NUM_SAMPLES: usize = 100;

#[test]
fn test_uniform_sample_count() {
    for space in space_fixtures() {
        let samples = space.sample_uniformly(NUM_SAMPLES).unwrap();
        let expected = NUM_SAMPLES.pow(space.dim() as u32);
        assert_eq!(samples.size_hint(), (expected, Some(expected)));
        assert_eq!(samples.count(), expected);
    }
}

#[test]
fn test_uniform_samples_within_bounds() {
    for space in space_fixtures() {
        for mu in space.sample_uniformly(NUM_SAMPLES).unwrap() {
            assert!(space.contains(&mu), "{} not in space", mu);
        }
    }
}

#[test]
fn test_uniform_grid_hits_bounds() {
    let space = Parameters::new([("x", 1)]).unwrap().space((0.1, 1.0)).unwrap();
    let samples: Vec<Mu> = space.sample_uniformly(NUM_SAMPLES).unwrap().collect();
    assert_eq!(samples.len(), NUM_SAMPLES);
    assert_eq!(samples.first().unwrap().get("x"), Some(&array![0.1]));
    assert_eq!(samples.last().unwrap().get("x"), Some(&array![1.0]));
}

#[test]
fn test_uniform_enumeration_is_restartable() {
    let space = Parameters::new([("x", 2)]).unwrap().space((0.0, 1.0)).unwrap();
    let first: Vec<Mu> = space.sample_uniformly(3).unwrap().collect();
    let second: Vec<Mu> = space.sample_uniformly(3).unwrap().collect();
    assert_eq!(first, second);

    // Early termination is possible at any point
    let mut samples = space.sample_uniformly(3).unwrap();
    let head: Vec<Mu> = samples.by_ref().take(4).collect();
    assert_eq!(head, first[..4].to_vec());
    assert_eq!(samples.size_hint(), (5, Some(5)));
    assert_eq!(samples.collect::<Vec<_>>(), first[4..].to_vec());
}

#[test]
fn test_random_sample_count() {
    for space in space_fixtures() {
        assert_eq!(space.sample_randomly(NUM_SAMPLES).len(), NUM_SAMPLES);
        assert!(space.sample_randomly(0).is_empty());
    }
}

#[test]
fn test_random_samples_within_bounds() {
    for space in space_fixtures() {
        for mu in space.sample_randomly(NUM_SAMPLES) {
            assert!(space.contains(&mu));
        }
    }
}

#[test]
fn test_random_sample_is_compatible() {
    for space in space_fixtures() {
        let mu = space.sample_random();
        assert!(space.parameters().is_compatible(&mu));
        assert!(space.contains(&mu));
    }
}

#[test]
fn test_random_with_rng() {
    let space = &space_fixtures()[2];
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let first = space.sample_randomly_with_rng(5, &mut rng);
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let second = space.sample_randomly_with_rng(5, &mut rng);
    assert_eq!(first, second);

    let unseeded = space
        .clone()
        .with_sampling_config(SamplingConfig::unseeded());
    assert!(unseeded.sample_randomly(5).iter().all(|mu| space.contains(mu)));
}

#[test]
fn test_logarithmic_sample_count() {
    for space in space_fixtures() {
        let expected = NUM_SAMPLES.pow(space.dim() as u32);
        assert_eq!(
            space.sample_logarithmic_uniformly(NUM_SAMPLES).unwrap().count(),
            expected
        );
        assert_eq!(
            space.sample_logarithmic_randomly(NUM_SAMPLES).unwrap().len(),
            NUM_SAMPLES
        );
    }
}

#[test]
fn test_logarithmic_samples_within_bounds() {
    for space in space_fixtures() {
        for mu in space.sample_logarithmic_uniformly(NUM_SAMPLES).unwrap() {
            assert!(space.contains(&mu));
        }
        for mu in space.sample_logarithmic_randomly(NUM_SAMPLES).unwrap() {
            assert!(space.contains(&mu));
        }
    }
}

#[test]
fn test_logarithmic_sampling_requires_positive_bounds() {
    let space = Parameters::new([("x", 1)]).unwrap().space((0.0, 1.0)).unwrap();
    assert!(matches!(
        space.sample_logarithmic_uniformly(3),
        Err(MorError::DomainError(_))
    ));
    assert!(matches!(
        space.sample_logarithmic_randomly(3),
        Err(MorError::DomainError(_))
    ));
    assert!(matches!(
        space.sample_logarithmic_random(),
        Err(MorError::DomainError(_))
    ));
}

#[test]
fn test_logarithmic_grid_spacing() {
    let space = Parameters::new([("x", 1)]).unwrap().space((1.0, 1000.0)).unwrap();
    let values: Vec<f64> = space
        .sample_logarithmic_uniformly(4)
        .unwrap()
        .map(|mu| mu.get("x").unwrap()[0])
        .collect();
    assert!(array_approx_eq(
        &array![values[0], values[1], values[2], values[3]],
        &array![1.0, 10.0, 100.0, 1000.0],
        1e-9
    ));
}

#[test]
fn test_per_parameter_grid() {
    let space = Parameters::new([("x", 1), ("y", 2)])
        .unwrap()
        .space(ParameterRanges::per_parameter([("x", (0.0, 1.0)), ("y", (10.0, 20.0))]))
        .unwrap();
    let samples = space
        .sample_uniformly(GridCounts::per_parameter([("x", 2), ("y", 3)]))
        .unwrap();
    assert_eq!(samples.total(), Some(2 * 3 * 3));

    let first = samples.get(0).unwrap();
    assert_eq!(first.to_array(), array![0.0, 10.0, 10.0]);
    let second = samples.get(1).unwrap();
    assert_eq!(second.to_array(), array![0.0, 10.0, 15.0]);
    let last = samples.get(17).unwrap();
    assert_eq!(last.to_array(), array![1.0, 20.0, 20.0]);
}

#[test]
fn test_contains() {
    let space = Parameters::new([("x", 1)]).unwrap().space((0.0, 1.0)).unwrap();
    assert!(space.contains(&Mu::new([("x", 0.5)]).unwrap()));
    assert!(!space.contains(&Mu::new([("x", -0.1)]).unwrap()));

    // Undeclared names are irrelevant for containment
    assert!(space.contains(&Mu::new([("x", 0.5), ("y", 100.0)]).unwrap()));
}

#[test]
fn test_clip() {
    let space = Parameters::new([("x", 1)]).unwrap().space((0.0, 1.0)).unwrap();
    let mu = Mu::new([("x", 1.5)]).unwrap();
    assert!(!space.contains(&mu));

    let clipped = space.clip(&mu, false);
    assert!(space.contains(&clipped));
    assert_eq!(clipped, Mu::new([("x", 1.0)]).unwrap());

    let with_test = Mu::new([("x", 1.5), ("x_test", 1.5)]).unwrap();
    let kept = space.clip(&with_test, true);
    assert!(space.contains(&kept));
    assert_eq!(kept.get("x"), Some(&array![1.0]));
    assert_eq!(kept.additional().get("x_test"), Some(&array![1.5]));

    let dropped = space.clip(&with_test, false);
    assert!(space.contains(&dropped));
    assert_eq!(dropped, clipped);
    assert!(dropped.additional().is_empty());
}

#[test]
fn test_clip_vector_parameter() {
    let space = Parameters::new([("x", 3)]).unwrap().space((0.0, 1.0)).unwrap();
    let mu = Mu::new([("x", vec![-1.0, 0.5, 2.0])]).unwrap();
    assert_eq!(space.clip(&mu, false).get("x"), Some(&array![0.0, 0.5, 1.0]));
}

#[test]
fn test_space_serialization() {
    let space = Parameters::new([("x", 2)])
        .unwrap()
        .space((0.1, 1.0))
        .unwrap()
        .with_sampling_config(SamplingConfig::with_seed(5));
    let json = space.to_json().unwrap();
    let restored = ParameterSpace::from_json(&json).unwrap();
    assert_eq!(restored, space);
    assert_eq!(restored.sample_randomly(3), space.sample_randomly(3));

    let invalid = r#"{"parameters": {"x": 1}, "ranges": {"x": {"low": 1.0, "high": 0.0}}}"#;
    assert!(ParameterSpace::from_json(invalid).is_err());
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_map_over_grid() {
    for space in space_fixtures() {
        let sequential: Vec<f64> = space
            .sample_uniformly(10)
            .unwrap()
            .map(|mu| mu.to_array().sum())
            .collect();
        let parallel = space
            .par_map_uniformly(10, |mu| mu.to_array().sum())
            .unwrap();
        assert_eq!(parallel, sequential);
    }
}
