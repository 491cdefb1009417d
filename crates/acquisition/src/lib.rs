//! EEG Acquisition
//!
//! Shared signal types for the command pipeline: channel signals, validated
//! multi-channel acquisitions, the canonical frequency bands, the
//! `SignalSource` contract, and sources that need no hardware (capture
//! replay and synthetic generation).

mod band;
mod error;
mod signal;
mod source;
pub mod synthetic;

pub use band::Band;
pub use error::AcquisitionError;
pub use signal::{deinterleave, Acquisition, ChannelSignal, RawChannel};
pub use source::{ReplaySource, SignalSource};
pub use synthetic::{SyntheticConfig, SyntheticGenerator, Waveform};
