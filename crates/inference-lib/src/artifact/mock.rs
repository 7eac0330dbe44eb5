//! Deterministic fallback model
//!
//! When no artifact bundle can be resolved the engine degrades to a
//! classifier trained in-process on a fixed synthetic dataset. The dataset
//! and seed are constants, so two processes (or two test runs) always build
//! byte-identical models. Mock bundles are never written to disk.

use super::ArtifactBundle;
use crate::classifier::NearestCentroid;
use crate::models::ArtifactMetadata;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed for the synthetic training set.
pub const MOCK_SEED: u64 = 42;

/// Version id reported for the fallback bundle.
pub const MOCK_VERSION_ID: &str = "fallback";

const SAMPLES_PER_CLASS: usize = 20;

/// Uniform noise half-width around each class center.
const NOISE: f64 = 0.25;

/// Class centers approximating the iris species means, in label order.
const CLASS_CENTERS: [(&str, [f64; 4]); 3] = [
    ("setosa", [5.0, 3.4, 1.5, 0.2]),
    ("versicolor", [5.9, 2.8, 4.3, 1.3]),
    ("virginica", [6.6, 3.0, 5.6, 2.1]),
];

const FEATURE_NAMES: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];

/// Build the guaranteed terminal fallback bundle.
///
/// Infallible by construction: the training set is fixed and always valid,
/// so a failure here is a fatal startup condition rather than a recoverable
/// runtime error.
pub fn build_mock_bundle() -> ArtifactBundle {
    let (samples, labels) = synthetic_dataset();
    let model = NearestCentroid::fit(&samples, &labels, CLASS_CENTERS.len())
        .expect("synthetic training set is fixed and always valid");

    let metadata = ArtifactMetadata {
        model_type: "NearestCentroidClassifier".to_string(),
        target_names: CLASS_CENTERS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect(),
        created_at: Utc::now(),
        feature_names: Some(FEATURE_NAMES.iter().map(|n| n.to_string()).collect()),
        accuracy: None,
        is_mock: true,
    };

    ArtifactBundle {
        version_id: MOCK_VERSION_ID.to_string(),
        model,
        metadata,
    }
}

/// Seeded cluster samples around each class center.
fn synthetic_dataset() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(MOCK_SEED);
    let mut samples = Vec::with_capacity(CLASS_CENTERS.len() * SAMPLES_PER_CLASS);
    let mut labels = Vec::with_capacity(samples.capacity());

    for (class, (_, center)) in CLASS_CENTERS.iter().enumerate() {
        for _ in 0..SAMPLES_PER_CLASS {
            let sample = center
                .iter()
                .map(|value| value + rng.random_range(-NOISE..NOISE))
                .collect();
            samples.push(sample);
            labels.push(class);
        }
    }

    (samples, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_bundle_shape() {
        let bundle = build_mock_bundle();
        assert_eq!(bundle.version_id, MOCK_VERSION_ID);
        assert!(bundle.metadata.is_mock);
        assert_eq!(
            bundle.metadata.target_names,
            vec!["setosa", "versicolor", "virginica"]
        );
        assert_eq!(bundle.model.num_classes(), 3);
        assert_eq!(bundle.model.num_features(), 4);
    }

    #[test]
    fn test_mock_bundle_is_deterministic() {
        let first = build_mock_bundle();
        let second = build_mock_bundle();
        assert_eq!(first.model, second.model);

        let probes = [
            [5.1, 3.5, 1.4, 0.2],
            [6.0, 2.9, 4.5, 1.5],
            [6.9, 3.1, 5.4, 2.1],
        ];
        for probe in probes {
            assert_eq!(first.model.predict(&probe), second.model.predict(&probe));
        }
    }

    #[test]
    fn test_mock_bundle_classifies_reference_sample_as_setosa() {
        let bundle = build_mock_bundle();
        assert_eq!(bundle.model.predict(&[5.1, 3.5, 1.4, 0.2]), 0);
    }
}
