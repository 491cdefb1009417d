//! Command Classifier
//!
//! Maps feature tensors to command labels with a small fully connected
//! network trained in-process. The classifier is either untrained or holds a
//! trained model (network, fitted scaler, history) that can be persisted.

mod dataset;
mod labels;
mod model;
mod network;

pub use dataset::{one_hot, Dataset, LabelledSample, TrainingSet};
pub use labels::{LabelMap, DEFAULT_COMMANDS};
pub use model::{Classifier, EpochStats, Prediction, TrainConfig, TrainedModel, TrainingHistory};
pub use network::Mlp;

use feature_engine::FeatureError;
use thiserror::Error;

/// Errors during training or prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("Model has not been trained yet")]
    NotTrained,
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Training set is empty")]
    EmptyDataset,
    #[error("Label {label} out of range for {classes} classes")]
    InvalidLabel { label: usize, classes: usize },
    #[error("Command list is empty")]
    EmptyCommands,
    #[error("Duplicate command: {0}")]
    DuplicateCommand(String),
    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
    #[error("Training failed: {0}")]
    TrainingFailed(String),
    #[error("Feature scaling failed: {0}")]
    Features(#[from] FeatureError),
}
