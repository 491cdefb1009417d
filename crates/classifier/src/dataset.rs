//! Labelled datasets and one-hot training sets

use crate::ClassifierError;
use feature_engine::FeatureTensor;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One feature tensor with its class index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledSample {
    pub features: FeatureTensor,
    pub label: usize,
}

/// Ordered labelled samples plus the command list they were labelled with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    commands: Vec<String>,
    samples: Vec<LabelledSample>,
}

impl Dataset {
    /// Empty dataset for a command list
    pub fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            samples: Vec::new(),
        }
    }

    /// Append a sample; the label must index the command list and the tensor
    /// must match the shape of earlier samples
    pub fn push(&mut self, features: FeatureTensor, label: usize) -> Result<(), ClassifierError> {
        if label >= self.commands.len() {
            return Err(ClassifierError::InvalidLabel {
                label,
                classes: self.commands.len(),
            });
        }
        if let Some(dim) = self.tensor_dim() {
            if features.dim() != dim {
                return Err(ClassifierError::InvalidInputShape {
                    expected: format!("{:?}", dim),
                    actual: format!("{:?}", features.dim()),
                });
            }
        }
        self.samples.push(LabelledSample { features, label });
        Ok(())
    }

    /// Command list
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Samples in insertion order
    pub fn samples(&self) -> &[LabelledSample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples were collected
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Shape shared by every tensor
    pub fn tensor_dim(&self) -> Option<(usize, usize, usize)> {
        self.samples.first().map(|s| s.features.dim())
    }

    /// Convert to a one-hot training set
    pub fn to_training_set(&self) -> Result<TrainingSet, ClassifierError> {
        TrainingSet::new(
            self.samples.iter().map(|s| s.features.clone()).collect(),
            self.samples.iter().map(|s| s.label).collect(),
            self.commands.len(),
        )
    }
}

/// One-hot encode class indices
pub fn one_hot(labels: &[usize], classes: usize) -> Result<Array2<f64>, ClassifierError> {
    let mut encoded = Array2::zeros((labels.len(), classes));
    for (row, &label) in labels.iter().enumerate() {
        if label >= classes {
            return Err(ClassifierError::InvalidLabel { label, classes });
        }
        encoded[[row, label]] = 1.0;
    }
    Ok(encoded)
}

/// Feature tensors with one-hot targets, ready for training
#[derive(Debug, Clone)]
pub struct TrainingSet {
    features: Vec<FeatureTensor>,
    labels: Vec<usize>,
    targets: Array2<f64>,
}

impl TrainingSet {
    /// Build from tensors and class indices
    pub fn new(features: Vec<FeatureTensor>, labels: Vec<usize>, classes: usize) -> Result<Self, ClassifierError> {
        if features.len() != labels.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} labels", features.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        let targets = one_hot(&labels, classes)?;
        Ok(Self {
            features,
            labels,
            targets,
        })
    }

    /// Feature tensors
    pub fn features(&self) -> &[FeatureTensor] {
        &self.features
    }

    /// Class indices
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// One-hot targets (samples x classes)
    pub fn targets(&self) -> &Array2<f64> {
        &self.targets
    }

    /// Number of classes
    pub fn class_count(&self) -> usize {
        self.targets.ncols()
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn commands() -> Vec<String> {
        vec!["left".to_string(), "right".to_string(), "stop".to_string()]
    }

    #[test]
    fn test_one_hot() {
        let encoded = one_hot(&[2, 0, 1], 3).unwrap();
        assert_eq!(encoded, array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(
            one_hot(&[3], 3).unwrap_err(),
            ClassifierError::InvalidLabel { label: 3, classes: 3 }
        );
    }

    #[test]
    fn test_push_validates() {
        let mut dataset = Dataset::new(commands());
        dataset.push(Array3::zeros((2, 55, 1)), 1).unwrap();
        assert!(matches!(
            dataset.push(Array3::zeros((2, 55, 1)), 3),
            Err(ClassifierError::InvalidLabel { .. })
        ));
        assert!(matches!(
            dataset.push(Array3::zeros((3, 55, 1)), 0),
            Err(ClassifierError::InvalidInputShape { .. })
        ));
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.tensor_dim(), Some((2, 55, 1)));
    }

    #[test]
    fn test_training_set_conversion() {
        let mut dataset = Dataset::new(commands());
        for label in [0, 2, 1, 2] {
            dataset.push(Array3::from_elem((1, 55, 1), label as f64), label).unwrap();
        }
        let set = dataset.to_training_set().unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.class_count(), 3);
        assert_eq!(set.labels(), &[0, 2, 1, 2]);
        assert_eq!(set.targets().row(1).to_vec(), vec![0.0, 0.0, 1.0]);
    }
}
