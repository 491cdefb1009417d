//! Band Decomposition
//!
//! Splits a channel into delta, theta, alpha, beta and gamma components by
//! masking its spectrum, and optionally up-samples the components with a
//! cubic spline for display.

mod decompose;
mod error;
mod resample;

pub use decompose::{BandDecomposer, BandSignals, Decomposition, Spectrum};
pub use error::DecompositionError;
pub use resample::{resample, CubicSpline, DEFAULT_RESAMPLE_FACTOR};
