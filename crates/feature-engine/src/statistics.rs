//! Statistical Features Computation

/// Moment statistics of a signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Skewness (asymmetry)
    pub skewness: f64,
    /// Excess kurtosis (tailedness)
    pub kurtosis: f64,
    /// Sum of squares
    pub energy: f64,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;

        // Mean
        let mean = values.iter().sum::<f64>() / n;

        // Variance and higher moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        let mut energy = 0.0;

        for &v in values {
            let d = v - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
            energy += v * v;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // Skewness: E[(X-μ)³] / σ³
        let skewness = if std_dev > 0.0 {
            (m3 / n) / (std_dev * std_dev * std_dev)
        } else {
            0.0
        };

        // Kurtosis: E[(X-μ)⁴] / σ⁴ - 3 (excess kurtosis)
        let kurtosis = if std_dev > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            skewness,
            kurtosis,
            energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.energy - 55.0).abs() < 1e-12);
    }

    #[test]
    fn test_variance_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatisticalFeatures::compute(&values);
        // Population variance is exactly 4 for this dataset
        assert!((stats.variance - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_skewness_sign() {
        let right_tail = StatisticalFeatures::compute(&[1.0, 1.0, 1.0, 1.0, 10.0]);
        let left_tail = StatisticalFeatures::compute(&[-10.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(right_tail.skewness > 0.0);
        assert!(left_tail.skewness < 0.0);
    }

    #[test]
    fn test_sine_kurtosis() {
        // Excess kurtosis of a sampled full-period sine is -1.5
        let values: Vec<f64> = (0..1000)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 100.0).sin())
            .collect();
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.kurtosis + 1.5).abs() < 1e-9);
        assert!(stats.skewness.abs() < 1e-9);
    }

    #[test]
    fn test_constant_has_zero_shape_moments() {
        let stats = StatisticalFeatures::compute(&[4.0; 16]);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
    }

    #[test]
    fn test_empty_values() {
        let values: Vec<f64> = vec![];
        let stats = StatisticalFeatures::compute(&values);
        assert_eq!(stats, StatisticalFeatures::default());
    }
}
