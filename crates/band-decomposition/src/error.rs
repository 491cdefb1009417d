//! Decomposition Error Types

use thiserror::Error;

/// Errors during band decomposition or resampling
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecompositionError {
    /// Not enough samples to transform or interpolate
    #[error("Signal too short: need at least {needed} samples, got {actual}")]
    SignalTooShort { needed: usize, actual: usize },

    /// Unusable sampling rate
    #[error("Invalid sampling rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Unusable resampling factor
    #[error("Invalid resampling factor: {0}")]
    InvalidFactor(f64),
}
