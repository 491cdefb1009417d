//! Second-order-section cascades

use crate::error::FilterError;
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Biquad coefficients (second-order section)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients [b0, b1, b2]
    pub b: [f64; 3],
    /// Denominator coefficients [a0=1, a1, a2]
    pub a: [f64; 3],
}

impl BiquadCoeffs {
    /// Steady-state internal state for a unit step input
    fn step_state(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let r0 = b1 - a1 * b0;
        let r1 = b2 - a2 * b0;
        let z0 = (r0 + r1) / (1.0 + a1 + a2);
        [z0, r1 - a2 * z0]
    }

    /// Gain at DC
    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }
}

/// Cascade of biquad sections, run in transposed direct form II
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosFilter {
    sections: Vec<BiquadCoeffs>,
    /// Length of the equivalent single transfer-function polynomials
    tf_len: usize,
}

impl SosFilter {
    /// Create a cascade; `tf_len` is the coefficient count of the
    /// equivalent transfer function (order + 1)
    pub fn new(sections: Vec<BiquadCoeffs>, tf_len: usize) -> Self {
        Self { sections, tf_len }
    }

    /// Sections in application order
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections
    }

    /// Edge padding used by [`SosFilter::filtfilt`]: 3 x max(len(b), len(a))
    pub fn padlen(&self) -> usize {
        3 * self.tf_len
    }

    /// Magnitude response at a frequency (Hz)
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * freq_hz / sample_rate;
        let z_inv = Complex64::new(0.0, -w).exp();
        let z_inv2 = z_inv * z_inv;
        self.sections
            .iter()
            .map(|s| {
                let num = s.b[0] + z_inv * s.b[1] + z_inv2 * s.b[2];
                let den = s.a[0] + z_inv * s.a[1] + z_inv2 * s.a[2];
                (num / den).norm()
            })
            .product()
    }

    /// Initial section states for a step response in steady state
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z0, z1] = section.step_state();
                let state = [scale * z0, scale * z1];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    /// Causal filtering with the given initial section states
    fn run(&self, input: &[f64], mut states: Vec<[f64; 2]>) -> Vec<f64> {
        let mut output = input.to_vec();
        for (section, state) in self.sections.iter().zip(states.iter_mut()) {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            for sample in output.iter_mut() {
                let x = *sample;
                let y = b0 * x + state[0];
                state[0] = b1 * x - a1 * y + state[1];
                state[1] = b2 * x - a2 * y;
                *sample = y;
            }
        }
        output
    }

    /// Single causal pass from rest
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        self.run(input, vec![[0.0; 2]; self.sections.len()])
    }

    /// Zero-phase forward-backward filtering.
    ///
    /// The signal is extended at both ends by odd reflection of `padlen()`
    /// samples and each pass starts from the steady state of its first
    /// sample. Fails when the signal is not longer than `padlen()`.
    pub fn filtfilt(&self, input: &[f64]) -> Result<Vec<f64>, FilterError> {
        let n = input.len();
        let padlen = self.padlen();
        if n <= padlen {
            return Err(FilterError::FilterLength { padlen, actual: n });
        }

        let first = input[0];
        let last = input[n - 1];
        let mut extended = Vec::with_capacity(n + 2 * padlen);
        extended.extend((1..=padlen).rev().map(|i| 2.0 * first - input[i]));
        extended.extend_from_slice(input);
        extended.extend((n - 1 - padlen..n - 1).rev().map(|i| 2.0 * last - input[i]));

        let steady = self.steady_state();
        let scaled = |x0: f64| steady.iter().map(|s| [s[0] * x0, s[1] * x0]).collect::<Vec<_>>();

        let forward = self.run(&extended, scaled(extended[0]));
        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        let backward = self.run(&reversed, scaled(reversed[0]));
        reversed = backward.into_iter().rev().collect();

        Ok(reversed[padlen..padlen + n].to_vec())
    }
}

/// Causal FIR filtering from rest (denominator 1)
pub(crate) fn fir_filter(taps: &[f64], input: &[f64]) -> Vec<f64> {
    (0..input.len())
        .map(|n| {
            taps.iter()
                .take(n + 1)
                .enumerate()
                .map(|(k, &h)| h * input[n - k])
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{butterworth, FilterBand};
    use proptest::prelude::*;

    const FS: f64 = 500.0;

    fn sine(freq: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / FS).sin()).collect()
    }

    #[test]
    fn test_filtfilt_preserves_constant_through_lowpass() {
        let filter = butterworth(4, FilterBand::Lowpass(30.0), FS).unwrap();
        let out = filter.filtfilt(&[3.0; 100]).unwrap();
        assert!(out.iter().all(|v| (v - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_removes_dc_through_bandpass() {
        let filter = butterworth(5, FilterBand::Bandpass(0.5, 50.0), FS).unwrap();
        let out = filter.filtfilt(&[5.0; 1000]).unwrap();
        assert!(out.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_filtfilt_zero_phase_passband() {
        let filter = butterworth(4, FilterBand::Lowpass(30.0), FS).unwrap();
        let input = sine(5.0, 1000);
        let out = filter.filtfilt(&input).unwrap();
        for i in 200..800 {
            assert!((out[i] - input[i]).abs() < 1e-3, "sample {}", i);
        }
    }

    #[test]
    fn test_notch_removes_line_noise() {
        let filter = butterworth(2, FilterBand::Bandstop(50.0 - 50.0 / 30.0, 50.0 + 50.0 / 30.0), FS).unwrap();
        let clean = sine(10.0, 1000);
        let noisy: Vec<f64> = clean.iter().zip(sine(50.0, 1000)).map(|(a, b)| a + b).collect();
        let out = filter.filtfilt(&noisy).unwrap();
        for i in 300..700 {
            assert!((out[i] - clean[i]).abs() < 0.01, "sample {}", i);
        }
    }

    #[test]
    fn test_filter_length_boundary() {
        let filter = butterworth(4, FilterBand::Lowpass(30.0), FS).unwrap();
        let padlen = filter.padlen();
        assert_eq!(
            filter.filtfilt(&vec![1.0; padlen]),
            Err(FilterError::FilterLength { padlen, actual: padlen })
        );
        assert!(filter.filtfilt(&vec![1.0; padlen + 1]).is_ok());
    }

    #[test]
    fn test_fir_filter_impulse_response() {
        let taps = [0.25, 0.5, 0.25];
        let out = fir_filter(&taps, &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(out, vec![0.25, 0.5, 0.25, 0.0]);
    }

    proptest! {
        #[test]
        fn prop_filtfilt_length_invariant(order in 1usize..6, extra in 0usize..40) {
            let filter = butterworth(order, FilterBand::Lowpass(40.0), FS).unwrap();
            let padlen = filter.padlen();
            let short = vec![0.5; padlen.saturating_sub(extra)];
            let is_length_error = matches!(
                filter.filtfilt(&short),
                Err(FilterError::FilterLength { .. })
            );
            prop_assert!(is_length_error);
            let long = vec![0.5; padlen + 1 + extra];
            let out = filter.filtfilt(&long).unwrap();
            prop_assert_eq!(out.len(), long.len());
        }
    }
}
