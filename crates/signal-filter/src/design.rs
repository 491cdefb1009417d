//! Filter design
//!
//! Butterworth: analog prototype -> frequency transform -> bilinear
//! transform (pre-warped), kept as zeros/poles/gain and then grouped into
//! second-order sections. FIR: Hamming-windowed sinc.

use crate::error::FilterError;
use crate::sos::{BiquadCoeffs, SosFilter};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sampling rate of the normalized digital domain used during design
const DESIGN_FS: f64 = 2.0;

/// Frequency response shape with cutoffs in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterBand {
    /// Pass below the cutoff
    Lowpass(f64),
    /// Pass between the two cutoffs
    Bandpass(f64, f64),
    /// Reject between the two cutoffs
    Bandstop(f64, f64),
}

/// Zeros, poles and gain
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Design a digital Butterworth filter of the given order
pub fn butterworth(order: usize, band: FilterBand, sample_rate: f64) -> Result<SosFilter, FilterError> {
    if order == 0 {
        return Err(FilterError::InvalidOrder(order));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(FilterError::InvalidSampleRate(sample_rate));
    }

    let nyquist = sample_rate / 2.0;
    let normalize = |cutoff_hz: f64| -> Result<f64, FilterError> {
        let wn = cutoff_hz / nyquist;
        if wn > 0.0 && wn < 1.0 {
            Ok(wn)
        } else {
            Err(FilterError::InvalidCutoff {
                cutoff_hz,
                sample_rate,
            })
        }
    };
    // Pre-warp a normalized frequency for the bilinear transform
    let warp = |wn: f64| 2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan();

    let prototype = analog_prototype(order);
    let analog = match band {
        FilterBand::Lowpass(cutoff) => lowpass_to_lowpass(prototype, warp(normalize(cutoff)?)),
        FilterBand::Bandpass(low, high) | FilterBand::Bandstop(low, high) => {
            let (w1, w2) = (warp(normalize(low)?), warp(normalize(high)?));
            if w2 <= w1 {
                return Err(FilterError::InvalidCutoff {
                    cutoff_hz: high,
                    sample_rate,
                });
            }
            let center = (w1 * w2).sqrt();
            let bandwidth = w2 - w1;
            if matches!(band, FilterBand::Bandpass(..)) {
                lowpass_to_bandpass(prototype, center, bandwidth)
            } else {
                lowpass_to_bandstop(prototype, center, bandwidth)
            }
        }
    };

    Ok(zpk_to_sos(bilinear(analog)))
}

/// Hamming-windowed sinc low-pass with unit DC gain
pub fn firwin_lowpass(num_taps: usize, cutoff_hz: f64, sample_rate: f64) -> Result<Vec<f64>, FilterError> {
    if num_taps == 0 {
        return Err(FilterError::InvalidOrder(num_taps));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(FilterError::InvalidSampleRate(sample_rate));
    }
    let cutoff = cutoff_hz / (sample_rate / 2.0);
    if !(cutoff > 0.0 && cutoff < 1.0) {
        return Err(FilterError::InvalidCutoff {
            cutoff_hz,
            sample_rate,
        });
    }

    let center = (num_taps - 1) as f64 / 2.0;
    let mut taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let m = i as f64 - center;
            let window = if num_taps == 1 {
                1.0
            } else {
                0.54 - 0.46 * (2.0 * PI * i as f64 / (num_taps - 1) as f64).cos()
            };
            cutoff * sinc(cutoff * m) * window
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= sum;
    }
    Ok(taps)
}

/// Normalized sinc, sin(pi x) / (pi x)
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Analog Butterworth low-pass prototype with unit cutoff
fn analog_prototype(order: usize) -> Zpk {
    let n = order as f64;
    let poles = (0..order)
        .map(|i| {
            let m = -(n - 1.0) + 2.0 * i as f64;
            -Complex64::new(0.0, PI * m / (2.0 * n)).exp()
        })
        .collect();
    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

fn relative_degree(zpk: &Zpk) -> usize {
    zpk.poles.len() - zpk.zeros.len()
}

fn lowpass_to_lowpass(zpk: Zpk, cutoff: f64) -> Zpk {
    let degree = relative_degree(&zpk) as i32;
    Zpk {
        zeros: zpk.zeros.iter().map(|&z| z * cutoff).collect(),
        poles: zpk.poles.iter().map(|&p| p * cutoff).collect(),
        gain: zpk.gain * cutoff.powi(degree),
    }
}

/// Split each root r into r/2*bw +- sqrt((r/2*bw)^2 - w0^2)
fn split_roots(roots: &[Complex64], center: f64) -> Vec<Complex64> {
    let w0_sq = Complex64::new(center * center, 0.0);
    let plus = roots.iter().map(move |&r| r + (r * r - w0_sq).sqrt());
    let minus = roots.iter().map(move |&r| r - (r * r - w0_sq).sqrt());
    plus.chain(minus).collect()
}

fn lowpass_to_bandpass(zpk: Zpk, center: f64, bandwidth: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let zeros_lp: Vec<_> = zpk.zeros.iter().map(|&z| z * (bandwidth / 2.0)).collect();
    let poles_lp: Vec<_> = zpk.poles.iter().map(|&p| p * (bandwidth / 2.0)).collect();

    let mut zeros = split_roots(&zeros_lp, center);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: split_roots(&poles_lp, center),
        gain: zpk.gain * bandwidth.powi(degree as i32),
    }
}

fn lowpass_to_bandstop(zpk: Zpk, center: f64, bandwidth: f64) -> Zpk {
    let degree = relative_degree(&zpk);
    let half_bw = Complex64::new(bandwidth / 2.0, 0.0);
    let zeros_hp: Vec<_> = zpk.zeros.iter().map(|&z| half_bw / z).collect();
    let poles_hp: Vec<_> = zpk.poles.iter().map(|&p| half_bw / p).collect();

    let mut zeros = split_roots(&zeros_hp, center);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, center)).take(degree));
    zeros.extend(std::iter::repeat(Complex64::new(0.0, -center)).take(degree));

    let num: Complex64 = zpk.zeros.iter().map(|&z| -z).product();
    let den: Complex64 = zpk.poles.iter().map(|&p| -p).product();

    Zpk {
        zeros,
        poles: split_roots(&poles_hp, center),
        gain: zpk.gain * (num / den).re,
    }
}

fn bilinear(zpk: Zpk) -> Zpk {
    let degree = relative_degree(&zpk);
    let fs2 = Complex64::new(2.0 * DESIGN_FS, 0.0);

    let mut zeros: Vec<_> = zpk.zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));
    let poles = zpk.poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    let num: Complex64 = zpk.zeros.iter().map(|&z| fs2 - z).product();
    let den: Complex64 = zpk.poles.iter().map(|&p| fs2 - p).product();

    Zpk {
        zeros,
        poles,
        gain: zpk.gain * (num / den).re,
    }
}

/// Group roots into real quadratic factors [1, c1, c2].
///
/// Conjugate pairs come first, then real roots paired smallest-with-largest,
/// then a leftover real root as a first-order factor.
fn quadratic_factors(roots: &[Complex64]) -> Vec<[f64; 3]> {
    let is_real = |r: &Complex64| r.im.abs() <= 1e-10 * r.norm().max(1.0);

    let mut factors: Vec<[f64; 3]> = roots
        .iter()
        .filter(|r| !is_real(r) && r.im > 0.0)
        .map(|r| [1.0, -2.0 * r.re, r.norm_sqr()])
        .collect();

    let mut reals: Vec<f64> = roots.iter().filter(|r| is_real(r)).map(|r| r.re).collect();
    reals.sort_by(|a, b| a.total_cmp(b));
    let (mut lo, mut hi) = (0usize, reals.len());
    while hi > lo + 1 {
        hi -= 1;
        factors.push([1.0, -(reals[lo] + reals[hi]), reals[lo] * reals[hi]]);
        lo += 1;
    }
    if hi == lo + 1 {
        factors.push([1.0, -reals[lo], 0.0]);
    }
    factors
}

fn zpk_to_sos(zpk: Zpk) -> SosFilter {
    let denominators = quadratic_factors(&zpk.poles);
    let mut numerators = quadratic_factors(&zpk.zeros);
    while numerators.len() < denominators.len() {
        numerators.push([1.0, 0.0, 0.0]);
    }

    let sections = numerators
        .into_iter()
        .zip(denominators)
        .enumerate()
        .map(|(i, (b, a))| {
            let scale = if i == 0 { zpk.gain } else { 1.0 };
            BiquadCoeffs {
                b: [b[0] * scale, b[1] * scale, b[2] * scale],
                a,
            }
        })
        .collect();

    // Length of the equivalent transfer-function polynomials
    let tf_len = zpk.zeros.len().max(zpk.poles.len()) + 1;
    SosFilter::new(sections, tf_len)
}
