//! Nearest-centroid classification
//!
//! The model type carried by artifact bundles, serialized as JSON on disk.
//! Training computes one mean vector per class; prediction returns the class
//! whose centroid is nearest in squared Euclidean distance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while fitting a classifier.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptyDataset,

    #[error("expected at least one class")]
    NoClasses,

    #[error("sample and label counts differ: {samples} samples, {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },

    #[error("sample {index} has {actual} features, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    #[error("class {class} has no training samples")]
    UnpopulatedClass { class: usize },
}

/// Multi-class nearest-centroid classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestCentroid {
    /// One mean feature vector per class, indexed by class label.
    centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    /// Fit centroids from labeled samples. Every class in `0..num_classes`
    /// must appear at least once and all samples must share one arity.
    pub fn fit(
        samples: &[Vec<f64>],
        labels: &[usize],
        num_classes: usize,
    ) -> Result<Self, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        if num_classes == 0 {
            return Err(TrainError::NoClasses);
        }
        if samples.len() != labels.len() {
            return Err(TrainError::LengthMismatch {
                samples: samples.len(),
                labels: labels.len(),
            });
        }

        let num_features = samples[0].len();
        let mut sums = vec![vec![0.0f64; num_features]; num_classes];
        let mut counts = vec![0usize; num_classes];

        for (index, (sample, &label)) in samples.iter().zip(labels).enumerate() {
            if sample.len() != num_features {
                return Err(TrainError::DimensionMismatch {
                    index,
                    expected: num_features,
                    actual: sample.len(),
                });
            }
            if label >= num_classes {
                return Err(TrainError::LabelOutOfRange { label, num_classes });
            }
            for (sum, value) in sums[label].iter_mut().zip(sample) {
                *sum += value;
            }
            counts[label] += 1;
        }

        let mut centroids = Vec::with_capacity(num_classes);
        for (class, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count == 0 {
                return Err(TrainError::UnpopulatedClass { class });
            }
            centroids.push(sum.into_iter().map(|v| v / count as f64).collect());
        }

        Ok(Self { centroids })
    }

    pub fn num_classes(&self) -> usize {
        self.centroids.len()
    }

    /// Input arity the model was trained with.
    pub fn num_features(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }

    /// Classify one feature vector. The caller validates arity; ties in
    /// distance resolve to the lowest class index.
    pub fn predict(&self, features: &[f64]) -> usize {
        let mut best_class = 0;
        let mut best_distance = f64::INFINITY;

        for (class, centroid) in self.centroids.iter().enumerate() {
            let distance: f64 = centroid
                .iter()
                .zip(features)
                .map(|(c, f)| (c - f) * (c - f))
                .sum();
            if distance < best_distance {
                best_distance = distance;
                best_class = class;
            }
        }

        best_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cluster_model() -> NearestCentroid {
        let samples = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.0],
            vec![10.0, 10.0],
            vec![9.8, 10.0],
        ];
        let labels = vec![0, 0, 1, 1];
        NearestCentroid::fit(&samples, &labels, 2).unwrap()
    }

    #[test]
    fn test_fit_and_predict() {
        let model = two_cluster_model();
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.num_features(), 2);
        assert_eq!(model.predict(&[0.5, 0.5]), 0);
        assert_eq!(model.predict(&[9.0, 9.0]), 1);
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        let result = NearestCentroid::fit(&[], &[], 2);
        assert!(matches!(result, Err(TrainError::EmptyDataset)));
    }

    #[test]
    fn test_fit_rejects_ragged_samples() {
        let samples = vec![vec![1.0, 2.0], vec![1.0]];
        let labels = vec![0, 1];
        let result = NearestCentroid::fit(&samples, &labels, 2);
        assert!(matches!(
            result,
            Err(TrainError::DimensionMismatch {
                index: 1,
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_fit_rejects_out_of_range_label() {
        let samples = vec![vec![1.0], vec![2.0]];
        let labels = vec![0, 2];
        let result = NearestCentroid::fit(&samples, &labels, 2);
        assert!(matches!(
            result,
            Err(TrainError::LabelOutOfRange {
                label: 2,
                num_classes: 2
            })
        ));
    }

    #[test]
    fn test_fit_rejects_unpopulated_class() {
        let samples = vec![vec![1.0], vec![2.0]];
        let labels = vec![0, 0];
        let result = NearestCentroid::fit(&samples, &labels, 2);
        assert!(matches!(result, Err(TrainError::UnpopulatedClass { class: 1 })));
    }

    #[test]
    fn test_predict_tie_resolves_to_lowest_class() {
        let samples = vec![vec![0.0], vec![2.0]];
        let labels = vec![0, 1];
        let model = NearestCentroid::fit(&samples, &labels, 2).unwrap();
        // Equidistant from both centroids.
        assert_eq!(model.predict(&[1.0]), 0);
    }
}
