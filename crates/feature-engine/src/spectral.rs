//! Welch Power Spectral Density

use crate::error::FeatureError;
use acquisition::Band;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Longest Welch segment
const MAX_SEGMENT: usize = 256;

/// Order in which band powers appear in a feature vector
pub const BAND_POWER_ORDER: [Band; 5] = [Band::Alpha, Band::Beta, Band::Theta, Band::Delta, Band::Gamma];

/// One-sided power spectral density
#[derive(Debug, Clone, Default)]
pub struct PowerSpectralDensity {
    /// Bin frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Density (units² / Hz)
    pub density: Vec<f64>,
}

impl PowerSpectralDensity {
    /// Sum of density values whose frequency falls in a band
    pub fn band_power(&self, band: Band) -> f64 {
        self.frequencies
            .iter()
            .zip(&self.density)
            .filter(|(freq, _)| band.contains(**freq))
            .map(|(_, p)| p)
            .sum()
    }

    /// Band powers in [`BAND_POWER_ORDER`]
    pub fn band_powers(&self) -> [f64; 5] {
        BAND_POWER_ORDER.map(|band| self.band_power(band))
    }

    /// Frequency of the largest density value
    pub fn peak_frequency(&self) -> Option<f64> {
        self.frequencies
            .iter()
            .zip(&self.density)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&freq, _)| freq)
    }
}

/// Welch estimator for signals of a fixed length.
///
/// Hann window (periodic), segment length min(256, N), 50% overlap, each
/// segment mean-detrended, density scaling.
pub struct WelchEstimator {
    sample_rate: f64,
    signal_len: usize,
    window: Vec<f64>,
    /// 1 / (fs * sum(w²))
    scale: f64,
    fft: Arc<dyn Fft<f64>>,
}

impl WelchEstimator {
    /// Create an estimator for signals of `signal_len` samples
    pub fn new(sample_rate: f64, signal_len: usize) -> Result<Self, FeatureError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(FeatureError::InvalidSampleRate(sample_rate));
        }
        if signal_len == 0 {
            return Err(FeatureError::EmptyInput("welch signal length"));
        }

        let segment = signal_len.min(MAX_SEGMENT);
        let window: Vec<f64> = (0..segment)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / segment as f64).cos())
            .collect();
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        // A one-sample Hann window is all zeros
        let scale = if window_power > 0.0 {
            1.0 / (sample_rate * window_power)
        } else {
            0.0
        };
        let fft = FftPlanner::new().plan_fft_forward(segment);

        Ok(Self {
            sample_rate,
            signal_len,
            window,
            scale,
            fft,
        })
    }

    /// Segment length in samples
    pub fn segment_len(&self) -> usize {
        self.window.len()
    }

    /// Estimate the PSD of a signal
    pub fn estimate(&self, signal: &[f64]) -> Result<PowerSpectralDensity, FeatureError> {
        if signal.len() != self.signal_len {
            return Err(FeatureError::ShapeMismatch {
                what: "welch signal length",
                expected: self.signal_len,
                actual: signal.len(),
            });
        }

        let segment = self.segment_len();
        let step = segment - segment / 2;
        let segments = (signal.len() - segment) / step + 1;
        let bins = segment / 2 + 1;

        let mut density = vec![0.0; bins];
        let mut buffer = vec![Complex::new(0.0, 0.0); segment];
        for s in 0..segments {
            let chunk = &signal[s * step..s * step + segment];
            let mean = chunk.iter().sum::<f64>() / segment as f64;
            for ((slot, &v), &w) in buffer.iter_mut().zip(chunk).zip(&self.window) {
                *slot = Complex::new((v - mean) * w, 0.0);
            }
            self.fft.process(&mut buffer);
            for (acc, c) in density.iter_mut().zip(&buffer) {
                *acc += c.norm_sqr() * self.scale;
            }
        }

        // Average, then fold negative frequencies onto positive ones; DC and
        // (for even segments) Nyquist have no mirror
        let last_doubled = if segment % 2 == 0 { bins - 1 } else { bins };
        for (k, p) in density.iter_mut().enumerate() {
            *p /= segments as f64;
            if k > 0 && k < last_doubled {
                *p *= 2.0;
            }
        }

        let resolution = self.sample_rate / segment as f64;
        Ok(PowerSpectralDensity {
            frequencies: (0..bins).map(|k| k as f64 * resolution).collect(),
            density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 500.0;

    fn sine(freq: f64, amp: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| amp * (2.0 * PI * freq * i as f64 / FS).sin()).collect()
    }

    #[test]
    fn test_peak_at_tone_frequency() {
        let welch = WelchEstimator::new(FS, 1000).unwrap();
        // 500/256 Hz bins; 19.53 Hz is bin 10
        let psd = welch.estimate(&sine(19.53125, 1.0, 1000)).unwrap();
        assert_eq!(psd.frequencies.len(), 129);
        assert!((psd.peak_frequency().unwrap() - 19.53125).abs() < 1e-9);
    }

    #[test]
    fn test_total_power_matches_variance() {
        // Integral of the density approximates the signal's mean square
        let welch = WelchEstimator::new(FS, 2000).unwrap();
        let psd = welch.estimate(&sine(19.53125, 2.0, 2000)).unwrap();
        let df = FS / welch.segment_len() as f64;
        let total: f64 = psd.density.iter().sum::<f64>() * df;
        assert!((total - 2.0).abs() < 0.05, "total {}", total);
    }

    #[test]
    fn test_constant_signal_has_no_power() {
        let welch = WelchEstimator::new(FS, 600).unwrap();
        let psd = welch.estimate(&[7.5; 600]).unwrap();
        assert!(psd.density.iter().all(|p| p.abs() < 1e-20));
    }

    #[test]
    fn test_band_powers_order() {
        let welch = WelchEstimator::new(FS, 1000).unwrap();
        let psd = welch.estimate(&sine(19.53125, 1.0, 1000)).unwrap();
        let powers = psd.band_powers();
        // beta is second in alpha, beta, theta, delta, gamma
        let max_index = powers
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(max_index, Some(1));
    }

    #[test]
    fn test_short_signal_uses_whole_length() {
        let welch = WelchEstimator::new(FS, 100).unwrap();
        assert_eq!(welch.segment_len(), 100);
        let psd = welch.estimate(&sine(50.0, 1.0, 100)).unwrap();
        assert_eq!(psd.density.len(), 51);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let welch = WelchEstimator::new(FS, 100).unwrap();
        assert!(matches!(welch.estimate(&[0.0; 99]), Err(FeatureError::ShapeMismatch { .. })));
        assert!(WelchEstimator::new(0.0, 100).is_err());
    }
}
