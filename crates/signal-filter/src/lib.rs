//! EEG Signal Filtering
//!
//! Removes line noise and band-limits raw channel samples. Butterworth
//! designs run as second-order-section cascades, zero-phase
//! (forward-backward) where the chain requires it.

mod chain;
mod design;
mod error;
mod preprocess;
mod sos;

pub use chain::{FilterChain, FilterConfig};
pub use design::{butterworth, firwin_lowpass, FilterBand};
pub use error::FilterError;
pub use preprocess::sanitize;
pub use sos::{BiquadCoeffs, SosFilter};
