//! Feature Error Types

use thiserror::Error;

/// Errors during feature extraction or scaling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// Input does not match the shape the extractor or scaler was built for
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Unusable sampling rate
    #[error("Invalid sampling rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Nothing to compute from
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
}
