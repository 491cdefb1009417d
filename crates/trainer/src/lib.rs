//! Training Orchestrator
//!
//! Wires acquisition, filtering, band decomposition and feature extraction
//! into a per-acquisition pipeline, collects labelled datasets, trains the
//! classifier and predicts commands from fresh acquisitions.

mod config;
mod orchestrator;
mod pipeline;
mod visualizer;

pub use config::{AcquisitionMode, DatasetSource, TrainerConfig};
pub use orchestrator::{CancellationToken, TrainingOrchestrator};
pub use pipeline::SignalPipeline;
pub use visualizer::{NullVisualizer, TracingVisualizer, Visualizer};

use acquisition::AcquisitionError;
use band_decomposition::DecompositionError;
use classifier::ClassifierError;
use feature_engine::FeatureError;
use signal_filter::FilterError;
use storage::StorageError;
use thiserror::Error;

/// Errors raised while collecting, training or predicting
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("Filter setup failed: {0}")]
    Filter(#[from] FilterError),
    #[error("Band decomposition failed: {0}")]
    Decomposition(#[from] DecompositionError),
    #[error("Feature extraction failed: {0}")]
    Features(#[from] FeatureError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Channel {0} could not be filtered")]
    ChannelDropped(usize),
    #[error("Dataset commands {found:?} do not match configured commands {expected:?}")]
    CommandMismatch { expected: Vec<String>, found: Vec<String> },
    #[error("Collection interrupted")]
    Interrupted,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
