//! Cubic-spline resampling

use crate::error::DecompositionError;

/// Up-sampling factor used for display
pub const DEFAULT_RESAMPLE_FACTOR: f64 = 10.0;

/// Natural cubic spline over uniformly spaced knots
#[derive(Debug, Clone)]
pub struct CubicSpline {
    start: f64,
    step: f64,
    values: Vec<f64>,
    /// Second derivatives at the knots
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Fit a spline through `values` sampled at `start + i * step`
    pub fn uniform(start: f64, step: f64, values: &[f64]) -> Result<Self, DecompositionError> {
        let n = values.len();
        if n < 2 {
            return Err(DecompositionError::SignalTooShort { needed: 2, actual: n });
        }

        // Tridiagonal system M[i-1] + 4 M[i] + M[i+1] = 6/h^2 * (second difference),
        // with M[0] = M[n-1] = 0, solved by forward elimination
        let mut curvature = vec![0.0; n];
        if n > 2 {
            let scale = 6.0 / (step * step);
            let inner = n - 2;
            let mut diag = vec![4.0; inner];
            let mut rhs: Vec<f64> = (1..n - 1)
                .map(|i| scale * (values[i + 1] - 2.0 * values[i] + values[i - 1]))
                .collect();
            for i in 1..inner {
                let w = 1.0 / diag[i - 1];
                diag[i] -= w;
                rhs[i] -= w * rhs[i - 1];
            }
            curvature[inner] = rhs[inner - 1] / diag[inner - 1];
            for i in (0..inner - 1).rev() {
                curvature[i + 1] = (rhs[i] - curvature[i + 2]) / diag[i];
            }
        }

        Ok(Self {
            start,
            step,
            values: values.to_vec(),
            curvature,
        })
    }

    /// Last knot position
    pub fn end(&self) -> f64 {
        self.start + self.step * (self.values.len() - 1) as f64
    }

    /// Value at `t`, clamped to the knot range
    pub fn evaluate(&self, t: f64) -> f64 {
        let last = self.values.len() - 1;
        let t = t.clamp(self.start, self.end());
        let i = (((t - self.start) / self.step).floor() as usize).min(last - 1);

        let x0 = self.start + self.step * i as f64;
        let b = (t - x0) / self.step;
        let a = 1.0 - b;
        let h2 = self.step * self.step / 6.0;

        a * self.values[i]
            + b * self.values[i + 1]
            + ((a * a * a - a) * self.curvature[i] + (b * b * b - b) * self.curvature[i + 1]) * h2
    }
}

/// Up-sample a signal by `factor`.
///
/// The output has `len * factor` points evenly spanning `[0, len / fs]`
/// inclusive; points past the last sample are held at its value.
pub fn resample(signal: &[f64], sample_rate: f64, factor: f64) -> Result<Vec<f64>, DecompositionError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DecompositionError::InvalidSampleRate(sample_rate));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DecompositionError::InvalidFactor(factor));
    }

    let spline = CubicSpline::uniform(0.0, 1.0 / sample_rate, signal)?;
    let duration = signal.len() as f64 / sample_rate;
    let count = (signal.len() as f64 * factor) as usize;
    let step = if count > 1 { duration / (count - 1) as f64 } else { 0.0 };

    Ok((0..count).map(|j| spline.evaluate(j as f64 * step)).collect())
}
