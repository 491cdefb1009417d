//! Input sanitizing

/// Replace infinities with NaN, then NaN with zero.
///
/// Every filter in the chain receives finite input only.
pub fn sanitize(samples: &[f64]) -> Vec<f64> {
    samples
        .iter()
        .map(|&v| if v.is_infinite() { f64::NAN } else { v })
        .map(|v| if v.is_nan() { 0.0 } else { v })
        .collect()
}
