//! Feature Tensor Assembly

use crate::error::FeatureError;
use crate::scaler::Scaler;
use crate::spectral::WelchEstimator;
use crate::statistics::StatisticalFeatures;
use crate::wavelet::MorletTransform;
use acquisition::Band;
use band_decomposition::BandSignals;
use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Values per band: 5 moments, 5 band powers, 1 wavelet energy
pub const FEATURES_PER_BAND: usize = 11;

/// Values per channel (all five bands)
pub const FEATURES_PER_CHANNEL: usize = FEATURES_PER_BAND * Band::COUNT;

/// Feature tensor, shape (channels, 55, 1)
pub type FeatureTensor = Array3<f64>;

/// Fixed acquisition shape the pipeline is built for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineShape {
    /// Number of channels
    pub channels: usize,
    /// Samples per channel
    pub samples: usize,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
}

impl Default for PipelineShape {
    fn default() -> Self {
        Self {
            channels: 4,
            samples: 1000,
            sample_rate: 500.0,
        }
    }
}

impl PipelineShape {
    /// Tensor shape produced for this acquisition shape
    pub fn tensor_dim(&self) -> (usize, usize, usize) {
        (self.channels, FEATURES_PER_CHANNEL, 1)
    }
}

/// Features of one band signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandFeatures {
    /// Moment statistics
    pub statistics: StatisticalFeatures,
    /// Welch band powers, ordered alpha, beta, theta, delta, gamma
    pub band_powers: [f64; 5],
    /// Wavelet energy
    pub wavelet_energy: f64,
}

impl BandFeatures {
    /// Flatten in feature-vector order
    pub fn to_array(&self) -> [f64; FEATURES_PER_BAND] {
        let s = &self.statistics;
        let p = &self.band_powers;
        [
            s.mean,
            s.variance,
            s.skewness,
            s.kurtosis,
            s.energy,
            p[0],
            p[1],
            p[2],
            p[3],
            p[4],
            self.wavelet_energy,
        ]
    }
}

/// Feature extractor for one acquisition shape
pub struct FeatureExtractor {
    shape: PipelineShape,
    welch: WelchEstimator,
    wavelet: MorletTransform,
}

impl FeatureExtractor {
    /// Create a new feature extractor
    pub fn new(shape: PipelineShape) -> Result<Self, FeatureError> {
        if shape.channels == 0 {
            return Err(FeatureError::EmptyInput("channel count"));
        }
        Ok(Self {
            shape,
            welch: WelchEstimator::new(shape.sample_rate, shape.samples)?,
            wavelet: MorletTransform::new(shape.samples)?,
        })
    }

    /// Acquisition shape
    pub fn shape(&self) -> PipelineShape {
        self.shape
    }

    /// Features of one band signal
    pub fn band_features(&self, signal: &[f64]) -> Result<BandFeatures, FeatureError> {
        Ok(BandFeatures {
            statistics: StatisticalFeatures::compute(signal),
            band_powers: self.welch.estimate(signal)?.band_powers(),
            wavelet_energy: self.wavelet.energy(signal)?,
        })
    }

    /// 55 values for one channel, bands delta to gamma
    pub fn channel_features(&self, bands: &BandSignals) -> Result<Vec<f64>, FeatureError> {
        if bands.sample_rate != self.shape.sample_rate {
            return Err(FeatureError::InvalidSampleRate(bands.sample_rate));
        }
        let mut values = Vec::with_capacity(FEATURES_PER_CHANNEL);
        for (_, signal) in bands.iter() {
            values.extend(self.band_features(signal)?.to_array());
        }
        Ok(values)
    }

    /// Unscaled (channels x 55) matrix with absolute values taken
    pub fn extract_matrix(&self, channels: &[BandSignals]) -> Result<Array2<f64>, FeatureError> {
        if channels.len() != self.shape.channels {
            return Err(FeatureError::ShapeMismatch {
                what: "channel count",
                expected: self.shape.channels,
                actual: channels.len(),
            });
        }

        let mut matrix = Array2::zeros((channels.len(), FEATURES_PER_CHANNEL));
        for (mut row, bands) in matrix.outer_iter_mut().zip(channels) {
            let values = self.channel_features(bands)?;
            for (slot, v) in row.iter_mut().zip(values) {
                *slot = v.abs();
            }
        }

        debug!("Extracted {}x{} feature matrix", matrix.nrows(), matrix.ncols());
        Ok(matrix)
    }

    /// Unscaled feature tensor, shape (channels, 55, 1)
    pub fn extract(&self, channels: &[BandSignals]) -> Result<FeatureTensor, FeatureError> {
        Ok(self.extract_matrix(channels)?.insert_axis(Axis(2)))
    }

    /// Scaled feature tensor using a previously fitted scaler
    pub fn extract_scaled(&self, channels: &[BandSignals], scaler: &Scaler) -> Result<FeatureTensor, FeatureError> {
        let mut matrix = self.extract_matrix(channels)?;
        scaler.transform_inplace(&mut matrix)?;
        Ok(matrix.insert_axis(Axis(2)))
    }
}
