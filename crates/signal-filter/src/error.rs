//! Filter Error Types

use thiserror::Error;

/// Errors during filter design or application
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Signal too short for zero-phase padding
    #[error("The length of the input vector must be greater than padlen, which is {padlen}. Data length is {actual}.")]
    FilterLength { padlen: usize, actual: usize },

    /// Cutoff not strictly inside (0, Nyquist)
    #[error("Cutoff {cutoff_hz} Hz is invalid for sample rate {sample_rate} Hz")]
    InvalidCutoff { cutoff_hz: f64, sample_rate: f64 },

    /// Unusable filter order or tap count
    #[error("Invalid filter order: {0}")]
    InvalidOrder(usize),

    /// Unusable sampling rate
    #[error("Invalid sampling rate: {0} Hz")]
    InvalidSampleRate(f64),
}
