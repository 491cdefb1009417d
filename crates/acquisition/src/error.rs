//! Acquisition Error Types

use thiserror::Error;

/// Errors that can occur while obtaining or interpreting an acquisition
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Raw samples could not be interpreted as a channel signal
    #[error("Unsupported signal format: {0}")]
    UnsupportedFormat(String),

    /// Signal source device failure
    #[error("Signal source device error: {0}")]
    Device(String),

    /// Timeout waiting for a full batch of samples
    #[error("Timeout waiting for acquisition after {0}ms")]
    Timeout(u64),

    /// Recorded source has no complete acquisition left
    #[error("Signal source exhausted: needed {needed} samples, {available} available")]
    Exhausted { needed: usize, available: usize },

    /// Sampling rate not usable
    #[error("Invalid sampling rate: {0} Hz")]
    InvalidSampleRate(f64),

    /// Generator or source settings out of range
    #[error("Invalid source configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for AcquisitionError {
    fn from(err: std::io::Error) -> Self {
        AcquisitionError::Device(err.to_string())
    }
}
