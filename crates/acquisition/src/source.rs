//! Signal sources
//!
//! A `SignalSource` delivers one full acquisition per call and blocks until
//! it has one. Device failures are returned to the caller as-is; no retry
//! policy lives here.

use crate::signal::deinterleave;
use crate::{Acquisition, AcquisitionError};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Source of multi-channel acquisitions
pub trait SignalSource {
    /// Block until `sample_count` samples are available on each of
    /// `channel_count` channels and return them as one acquisition.
    fn get_signals(
        &mut self,
        channel_count: usize,
        sample_count: usize,
    ) -> Result<Acquisition, AcquisitionError>;

    /// Sampling rate of delivered acquisitions (Hz)
    fn sample_rate(&self) -> f64;
}

/// Replays a captured round-robin ADC stream (big-endian 16-bit words)
pub struct ReplaySource {
    /// Decoded words of the whole capture
    words: Vec<u16>,
    /// Read position in `words`
    position: usize,
    /// Sampling rate of the capture (Hz)
    sample_rate: f64,
    /// Consecutive blocks averaged into each delivered acquisition
    epochs: usize,
}

impl ReplaySource {
    /// Load a capture from any reader
    pub fn from_reader<R: Read>(mut reader: R, sample_rate: f64) -> Result<Self, AcquisitionError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(AcquisitionError::InvalidSampleRate(sample_rate));
        }
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.len() % 2 != 0 {
            return Err(AcquisitionError::UnsupportedFormat(format!(
                "capture of {} bytes is not a sequence of 16-bit words",
                bytes.len()
            )));
        }
        let words = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect::<Vec<_>>();
        info!("Loaded replay capture with {} ADC words", words.len());

        Ok(Self {
            words,
            position: 0,
            sample_rate,
            epochs: 1,
        })
    }

    /// Load a capture file
    pub fn open(path: impl AsRef<Path>, sample_rate: f64) -> Result<Self, AcquisitionError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file), sample_rate)
    }

    /// Deliver the mean of `epochs` consecutive blocks per acquisition
    pub fn with_epoch_averaging(mut self, epochs: usize) -> Self {
        self.epochs = epochs.max(1);
        self
    }

    /// Words not yet replayed
    pub fn remaining(&self) -> usize {
        self.words.len() - self.position
    }
}

impl SignalSource for ReplaySource {
    fn get_signals(
        &mut self,
        channel_count: usize,
        sample_count: usize,
    ) -> Result<Acquisition, AcquisitionError> {
        let block = channel_count * sample_count;
        let needed = block * self.epochs;
        if needed == 0 || self.remaining() < needed {
            return Err(AcquisitionError::Exhausted {
                needed,
                available: self.remaining(),
            });
        }

        let chunk = &self.words[self.position..self.position + needed];
        self.position += needed;
        debug!(
            "Replaying {} channels x {} samples over {} epoch(s) ({} words left)",
            channel_count,
            sample_count,
            self.epochs,
            self.remaining()
        );

        let epochs = chunk
            .chunks_exact(block)
            .map(|words| Acquisition::new(self.sample_rate, deinterleave(words, channel_count, sample_count)))
            .collect::<Result<Vec<_>, _>>()?;
        match epochs.as_slice() {
            [single] => Ok(single.clone()),
            _ => Acquisition::average(&epochs),
        }
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
