//! FFT-based Band Decomposition

use crate::error::DecompositionError;
use crate::resample::resample;
use acquisition::{Band, ChannelSignal};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One-sided magnitude spectrum of a channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin frequencies (Hz), from 0 up to but excluding Nyquist
    pub frequencies: Vec<f64>,
    /// Bin magnitudes |X[k]| / N
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of the strongest bin, ignoring DC
    pub fn peak_frequency(&self) -> Option<f64> {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&freq, _)| freq)
    }

    /// Largest magnitude inside a band
    pub fn band_peak(&self, band: Band) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .filter(|(freq, _)| band.contains(**freq))
            .map(|(_, &mag)| mag)
            .fold(0.0, f64::max)
    }
}

/// Band components of one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandSignals {
    /// Source channel index
    pub channel: usize,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
    /// One signal per band, in [`Band::ALL`] order
    signals: Vec<Vec<f64>>,
}

impl BandSignals {
    /// Component for one band
    pub fn get(&self, band: Band) -> &[f64] {
        &self.signals[band.index()]
    }

    /// Components in ascending band order
    pub fn iter(&self) -> impl Iterator<Item = (Band, &[f64])> {
        Band::ALL.into_iter().zip(self.signals.iter().map(Vec::as_slice))
    }

    /// Samples per component
    pub fn sample_count(&self) -> usize {
        self.signals.first().map_or(0, Vec::len)
    }

    /// Sum of all components
    pub fn reconstruct(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.sample_count()];
        for signal in &self.signals {
            for (acc, v) in total.iter_mut().zip(signal) {
                *acc += v;
            }
        }
        total
    }

    /// Every component up-sampled by `factor` with a cubic spline
    pub fn resampled(&self, factor: f64) -> Result<Vec<(Band, Vec<f64>)>, DecompositionError> {
        self.iter()
            .map(|(band, signal)| Ok((band, resample(signal, self.sample_rate, factor)?)))
            .collect()
    }
}

/// Band components plus the spectrum they were cut from
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub bands: BandSignals,
    pub spectrum: Spectrum,
}

/// Decomposes channels into bands by spectral masking
pub struct BandDecomposer {
    planner: FftPlanner<f64>,
}

impl Default for BandDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl BandDecomposer {
    /// Create a decomposer
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Band components of a channel
    pub fn decompose(&mut self, signal: &ChannelSignal) -> Result<BandSignals, DecompositionError> {
        Ok(self.analyze(signal)?.bands)
    }

    /// Band components and one-sided spectrum of a channel
    pub fn analyze(&mut self, signal: &ChannelSignal) -> Result<Decomposition, DecompositionError> {
        let spectrum = self.forward(&signal.samples, signal.sample_rate)?;
        let n = spectrum.len();
        let resolution = signal.sample_rate / n as f64;
        let inverse = self.planner.plan_fft_inverse(n);

        let signals: Vec<Vec<f64>> = Band::ALL
            .iter()
            .map(|band| {
                let mut masked = vec![Complex::new(0.0, 0.0); n];
                // Keep each in-band bin together with its mirror so the
                // inverse transform is real; the Nyquist bin is never kept
                for k in 0..n / 2 {
                    if band.contains(k as f64 * resolution) {
                        let mirror = (n - k) % n;
                        masked[k] = spectrum[k];
                        masked[mirror] = spectrum[mirror];
                    }
                }
                inverse.process(&mut masked);
                masked.iter().map(|c| c.re / n as f64).collect()
            })
            .collect();

        debug!(
            "Decomposed channel {} ({} samples, {:.3} Hz/bin)",
            signal.channel, n, resolution
        );

        Ok(Decomposition {
            bands: BandSignals {
                channel: signal.channel,
                sample_rate: signal.sample_rate,
                signals,
            },
            spectrum: one_sided(&spectrum, signal.sample_rate),
        })
    }

    /// One-sided magnitude spectrum of raw samples
    pub fn spectrum(&mut self, samples: &[f64], sample_rate: f64) -> Result<Spectrum, DecompositionError> {
        let full = self.forward(samples, sample_rate)?;
        Ok(one_sided(&full, sample_rate))
    }

    fn forward(&mut self, samples: &[f64], sample_rate: f64) -> Result<Vec<Complex<f64>>, DecompositionError> {
        if samples.len() < 2 {
            return Err(DecompositionError::SignalTooShort {
                needed: 2,
                actual: samples.len(),
            });
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DecompositionError::InvalidSampleRate(sample_rate));
        }

        let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&v| Complex::new(v, 0.0)).collect();
        self.planner.plan_fft_forward(buffer.len()).process(&mut buffer);
        Ok(buffer)
    }
}

/// Bins 0..N/2 (exclusive), so the Nyquist bin of an even-length signal is
/// left out
fn one_sided(full: &[Complex<f64>], sample_rate: f64) -> Spectrum {
    let n = full.len();
    let resolution = sample_rate / n as f64;
    let (frequencies, magnitudes) = full
        .iter()
        .take(n / 2)
        .enumerate()
        .map(|(k, c)| (k as f64 * resolution, c.norm() / n as f64))
        .unzip();
    Spectrum {
        frequencies,
        magnitudes,
    }
}
