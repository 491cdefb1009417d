//! Trainer Configuration

use classifier::{TrainConfig, DEFAULT_COMMANDS};
use feature_engine::PipelineShape;
use serde::{Deserialize, Serialize};
use signal_filter::FilterConfig;
use std::path::PathBuf;

/// Where acquisitions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// A device or captured device stream
    Hardware,
    /// The synthetic generator
    Synthetic,
}

/// Where the training dataset comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetSource {
    /// Load a saved dataset; collection is skipped
    LoadFrom { path: PathBuf },
    /// Collect a fresh dataset, optionally saving it afterwards
    Collect {
        samples_per_command: usize,
        save_to: Option<PathBuf>,
    },
}

impl Default for DatasetSource {
    fn default() -> Self {
        DatasetSource::Collect {
            samples_per_command: 5,
            save_to: None,
        }
    }
}

/// Training orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Ordered command list; position is the class index
    pub commands: Vec<String>,
    /// Channels, samples per channel and sampling rate
    pub shape: PipelineShape,
    /// Filter chain stages
    pub filter: FilterConfig,
    /// Acquisition mode
    pub mode: AcquisitionMode,
    /// Dataset source
    pub dataset: DatasetSource,
    /// Classifier hyper-parameters
    pub training: TrainConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
            shape: PipelineShape::default(),
            filter: FilterConfig::default(),
            mode: AcquisitionMode::Hardware,
            dataset: DatasetSource::default(),
            training: TrainConfig::default(),
        }
    }
}

impl TrainerConfig {
    /// Synthetic acquisitions with a short training schedule
    pub fn synthetic() -> Self {
        Self {
            mode: AcquisitionMode::Synthetic,
            training: TrainConfig::quick(),
            ..Default::default()
        }
    }
}
