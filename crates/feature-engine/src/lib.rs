//! Feature Engineering Engine
//!
//! Turns the band signals of every channel into a fixed-size feature tensor:
//! per band, five moments, five Welch band powers and one wavelet energy.

mod error;
mod features;
mod scaler;
mod spectral;
mod statistics;
mod wavelet;

pub use error::FeatureError;
pub use features::{
    BandFeatures, FeatureExtractor, FeatureTensor, PipelineShape, FEATURES_PER_BAND, FEATURES_PER_CHANNEL,
};
pub use scaler::Scaler;
pub use spectral::{PowerSpectralDensity, WelchEstimator, BAND_POWER_ORDER};
pub use statistics::StatisticalFeatures;
pub use wavelet::MorletTransform;
