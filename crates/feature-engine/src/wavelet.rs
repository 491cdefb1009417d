//! Continuous Wavelet Transform (real Morlet)

use crate::error::FeatureError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Largest integer scale
const MAX_SCALE: usize = 30;

/// Kernel half-width in units of scale
const SUPPORT: f64 = 8.0;

/// Mother wavelet exp(-t²/2)·cos(5t)
fn morlet(t: f64) -> f64 {
    (-0.5 * t * t).exp() * (5.0 * t).cos()
}

/// CWT over scales 1..=30 for signals of a fixed length.
///
/// Kernel spectra are computed once; each transform is one forward FFT of
/// the signal plus one inverse FFT per scale.
pub struct MorletTransform {
    signal_len: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    kernels: Vec<Vec<Complex<f64>>>,
}

impl MorletTransform {
    /// Create a transform for signals of `signal_len` samples
    pub fn new(signal_len: usize) -> Result<Self, FeatureError> {
        if signal_len == 0 {
            return Err(FeatureError::EmptyInput("wavelet signal length"));
        }

        let max_half_width = (SUPPORT * MAX_SCALE as f64).ceil() as usize;
        // Room for the full linear convolution, so circular wrap-around only
        // touches zero padding
        let fft_len = signal_len + 2 * max_half_width;
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        let kernels = (1..=MAX_SCALE)
            .map(|scale| {
                let scale = scale as f64;
                let half_width = (SUPPORT * scale).ceil() as i64;
                let norm = 1.0 / scale.sqrt();
                let mut kernel = vec![Complex::new(0.0, 0.0); fft_len];
                // Centred kernel stored circularly: tap j at index j mod fft_len
                for j in -half_width..=half_width {
                    let index = j.rem_euclid(fft_len as i64) as usize;
                    kernel[index] = Complex::new(norm * morlet(j as f64 / scale), 0.0);
                }
                forward.process(&mut kernel);
                kernel
            })
            .collect();

        Ok(Self {
            signal_len,
            fft_len,
            forward,
            inverse,
            kernels,
        })
    }

    /// Coefficients per scale (rows) and sample (columns)
    pub fn transform(&self, signal: &[f64]) -> Result<Vec<Vec<f64>>, FeatureError> {
        if signal.len() != self.signal_len {
            return Err(FeatureError::ShapeMismatch {
                what: "wavelet signal length",
                expected: self.signal_len,
                actual: signal.len(),
            });
        }

        let mut spectrum = vec![Complex::new(0.0, 0.0); self.fft_len];
        for (slot, &v) in spectrum.iter_mut().zip(signal) {
            *slot = Complex::new(v, 0.0);
        }
        self.forward.process(&mut spectrum);

        let norm = 1.0 / self.fft_len as f64;
        Ok(self
            .kernels
            .iter()
            .map(|kernel| {
                let mut product: Vec<Complex<f64>> =
                    spectrum.iter().zip(kernel).map(|(x, h)| x * h).collect();
                self.inverse.process(&mut product);
                product[..self.signal_len].iter().map(|c| c.re * norm).collect()
            })
            .collect())
    }

    /// Sum of squared coefficients over all scales
    pub fn energy(&self, signal: &[f64]) -> Result<f64, FeatureError> {
        Ok(self
            .transform(signal)?
            .iter()
            .flatten()
            .map(|c| c * c)
            .sum())
    }
}
