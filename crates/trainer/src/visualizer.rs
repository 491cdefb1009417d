//! Visualization hooks

use acquisition::ChannelSignal;
use band_decomposition::{BandSignals, Spectrum};
use classifier::Prediction;
use tracing::{debug, info, warn};

/// Receives intermediate pipeline output; every hook defaults to a no-op
pub trait Visualizer {
    fn raw_signal(&mut self, _signal: &ChannelSignal) {}
    fn filtered_signal(&mut self, _signal: &ChannelSignal) {}
    fn band_signals(&mut self, _bands: &BandSignals) {}
    fn spectrum(&mut self, _channel: usize, _spectrum: &Spectrum) {}
    fn prediction(&mut self, _prediction: &Prediction) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {}

/// Logs signal summaries at debug level
#[derive(Debug, Clone, Default)]
pub struct TracingVisualizer {
    /// Also up-sample band signals by this factor, as a display would
    pub resample_factor: Option<f64>,
}

impl TracingVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up-sample band signals before summarizing them
    pub fn with_resampling(factor: f64) -> Self {
        Self {
            resample_factor: Some(factor),
        }
    }
}

fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|v| v * v).sum::<f64>() / samples.len() as f64).sqrt()
}

impl Visualizer for TracingVisualizer {
    fn raw_signal(&mut self, signal: &ChannelSignal) {
        debug!("Raw channel {}: {} samples, rms {:.3}", signal.channel, signal.len(), rms(&signal.samples));
    }

    fn filtered_signal(&mut self, signal: &ChannelSignal) {
        debug!("Filtered channel {}: rms {:.3}", signal.channel, rms(&signal.samples));
    }

    fn band_signals(&mut self, bands: &BandSignals) {
        for (band, samples) in bands.iter() {
            debug!("Channel {} {}: rms {:.3}", bands.channel, band, rms(samples));
        }
        if let Some(factor) = self.resample_factor {
            match bands.resampled(factor) {
                Ok(resampled) => {
                    for (band, samples) in resampled {
                        debug!("Channel {} {} resampled to {} points", bands.channel, band, samples.len());
                    }
                }
                Err(e) => warn!("Resampling channel {} failed: {}", bands.channel, e),
            }
        }
    }

    fn spectrum(&mut self, channel: usize, spectrum: &Spectrum) {
        if let Some(peak) = spectrum.peak_frequency() {
            debug!("Channel {} spectrum peak at {:.2} Hz", channel, peak);
        }
    }

    fn prediction(&mut self, prediction: &Prediction) {
        info!("Predicted command: {} ({:.1}%)", prediction.command, prediction.confidence() * 100.0);
    }
}
