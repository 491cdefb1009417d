//! Storage Layer
//!
//! Persists collected datasets (postcard archives) and trained models
//! (JSON snapshots) on the local filesystem.

mod dataset_store;
mod model_store;

pub use dataset_store::{DatasetStore, PostcardDatasetStore};
pub use model_store::ModelStore;

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("No dataset found at {}", .0.display())]
    DatasetNotFound(PathBuf),
    #[error("No model found at {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Unsupported archive version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}
