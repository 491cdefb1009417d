//! Column-wise standardization

use crate::error::FeatureError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler fitted once on training rows and reused unchanged.
///
/// Stores per-column mean and population standard deviation; a column with
/// zero deviation is only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    /// Fit on rows (samples) by columns (features)
    pub fn fit(rows: ArrayView2<'_, f64>) -> Result<Self, FeatureError> {
        if rows.nrows() == 0 {
            return Err(FeatureError::EmptyInput("scaler fit rows"));
        }
        let mean = rows
            .mean_axis(Axis(0))
            .ok_or(FeatureError::EmptyInput("scaler fit rows"))?;
        let scale = rows
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    /// Identity scaler for `columns` features
    pub fn identity(columns: usize) -> Self {
        Self {
            mean: Array1::zeros(columns),
            scale: Array1::ones(columns),
        }
    }

    /// Number of feature columns
    pub fn columns(&self) -> usize {
        self.mean.len()
    }

    /// Whether mean and divisor agree in length and every divisor is usable.
    ///
    /// Always true for fitted scalers; deserialized ones may not be.
    pub fn is_well_formed(&self) -> bool {
        self.mean.len() == self.scale.len()
            && self.mean.iter().all(|m| m.is_finite())
            && self.scale.iter().all(|s| s.is_finite() && *s != 0.0)
    }

    /// Standardize rows without refitting
    pub fn transform(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>, FeatureError> {
        let mut out = rows.to_owned();
        self.transform_inplace(&mut out)?;
        Ok(out)
    }

    /// Standardize rows in place
    pub fn transform_inplace(&self, rows: &mut Array2<f64>) -> Result<(), FeatureError> {
        if rows.ncols() != self.columns() {
            return Err(FeatureError::ShapeMismatch {
                what: "scaler columns",
                expected: self.columns(),
                actual: rows.ncols(),
            });
        }
        if self.scale.len() != self.columns() {
            return Err(FeatureError::ShapeMismatch {
                what: "scaler divisors",
                expected: self.columns(),
                actual: self.scale.len(),
            });
        }
        for mut row in rows.outer_iter_mut() {
            row -= &self.mean;
            row /= &self.scale;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_standardizes_columns() {
        let rows = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = Scaler::fit(rows.view()).unwrap();
        let out = scaler.transform(rows.view()).unwrap();

        let col0 = out.column(0);
        assert!(col0.mean().unwrap().abs() < 1e-12);
        assert!((col0.std(0.0) - 1.0).abs() < 1e-12);
        // Constant column is centred, not divided by zero
        assert!(out.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_does_not_refit() {
        let scaler = Scaler::fit(array![[0.0], [2.0]].view()).unwrap();
        let out = scaler.transform(array![[4.0]].view()).unwrap();
        // mean 1, std 1
        assert_eq!(out[[0, 0]], 3.0);
    }

    #[test]
    fn test_column_mismatch() {
        let scaler = Scaler::identity(3);
        let err = scaler.transform(array![[1.0, 2.0]].view()).unwrap_err();
        assert_eq!(
            err,
            FeatureError::ShapeMismatch {
                what: "scaler columns",
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_inconsistent_scaler_is_rejected() {
        let scaler: Scaler = serde_json::from_str(r#"{"mean":{"v":1,"dim":[2],"data":[0.0,0.0]},"scale":{"v":1,"dim":[1],"data":[1.0]}}"#).unwrap();
        assert!(!scaler.is_well_formed());
        let err = scaler.transform(array![[1.0, 2.0]].view()).unwrap_err();
        assert!(matches!(err, FeatureError::ShapeMismatch { what: "scaler divisors", .. }));

        assert!(Scaler::identity(3).is_well_formed());
        assert!(Scaler::fit(array![[1.0], [3.0]].view()).unwrap().is_well_formed());
    }

    #[test]
    fn test_empty_fit_rejected() {
        let rows = Array2::<f64>::zeros((0, 4));
        assert!(matches!(Scaler::fit(rows.view()), Err(FeatureError::EmptyInput(_))));
    }
}
