//! Per-acquisition signal pipeline

use crate::visualizer::Visualizer;
use crate::TrainerError;
use acquisition::Acquisition;
use band_decomposition::BandDecomposer;
use feature_engine::{FeatureError, FeatureExtractor, FeatureTensor, PipelineShape};
use signal_filter::{FilterChain, FilterConfig};
use tracing::debug;

/// Filter -> decompose -> extract, for one fixed acquisition shape
pub struct SignalPipeline {
    shape: PipelineShape,
    filter: FilterChain,
    decomposer: BandDecomposer,
    extractor: FeatureExtractor,
}

impl SignalPipeline {
    /// Design filters and feature transforms for a shape
    pub fn new(shape: PipelineShape, filter: FilterConfig) -> Result<Self, TrainerError> {
        let filter = FilterChain::new(filter, shape.sample_rate)?;
        if shape.samples < filter.min_length() {
            return Err(TrainerError::InvalidConfig(format!(
                "{} samples per channel is too short for the filter chain (needs {})",
                shape.samples,
                filter.min_length()
            )));
        }
        Ok(Self {
            shape,
            filter,
            decomposer: BandDecomposer::new(),
            extractor: FeatureExtractor::new(shape)?,
        })
    }

    /// Acquisition shape
    pub fn shape(&self) -> PipelineShape {
        self.shape
    }

    fn check_shape(&self, acquisition: &Acquisition) -> Result<(), TrainerError> {
        let checks = [
            ("channel count", self.shape.channels, acquisition.channel_count()),
            ("samples per channel", self.shape.samples, acquisition.sample_count()),
        ];
        for (what, expected, actual) in checks {
            if expected != actual {
                return Err(FeatureError::ShapeMismatch { what, expected, actual }.into());
            }
        }
        if acquisition.sample_rate() != self.shape.sample_rate {
            return Err(FeatureError::InvalidSampleRate(acquisition.sample_rate()).into());
        }
        Ok(())
    }

    /// Unscaled feature tensor for one acquisition.
    ///
    /// A channel that fails filtering drops the whole acquisition with
    /// `ChannelDropped`.
    pub fn process(
        &mut self,
        acquisition: &Acquisition,
        visualizer: &mut dyn Visualizer,
    ) -> Result<FeatureTensor, TrainerError> {
        self.check_shape(acquisition)?;
        for channel in acquisition.channels() {
            visualizer.raw_signal(channel);
        }

        let filtered = self.filter.filter_acquisition(acquisition);
        let mut bands = Vec::with_capacity(filtered.len());
        for (index, channel) in filtered.into_iter().enumerate() {
            let channel = channel.ok_or(TrainerError::ChannelDropped(index))?;
            visualizer.filtered_signal(&channel);

            let decomposition = self.decomposer.analyze(&channel)?;
            visualizer.spectrum(channel.channel, &decomposition.spectrum);
            visualizer.band_signals(&decomposition.bands);
            bands.push(decomposition.bands);
        }

        let tensor = self.extractor.extract(&bands)?;
        debug!("Pipeline produced tensor {:?}", tensor.dim());
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::NullVisualizer;
    use acquisition::{ChannelSignal, SyntheticConfig, SyntheticGenerator};
    use band_decomposition::BandSignals;

    fn shape() -> PipelineShape {
        PipelineShape {
            channels: 2,
            samples: 500,
            sample_rate: 500.0,
        }
    }

    #[derive(Default)]
    struct Counting {
        raw: usize,
        filtered: usize,
        bands: usize,
        spectra: usize,
    }

    impl Visualizer for Counting {
        fn raw_signal(&mut self, _signal: &ChannelSignal) {
            self.raw += 1;
        }
        fn filtered_signal(&mut self, _signal: &ChannelSignal) {
            self.filtered += 1;
        }
        fn band_signals(&mut self, _bands: &BandSignals) {
            self.bands += 1;
        }
        fn spectrum(&mut self, _channel: usize, _spectrum: &band_decomposition::Spectrum) {
            self.spectra += 1;
        }
    }

    #[test]
    fn test_process_produces_tensor() {
        let mut pipeline = SignalPipeline::new(shape(), FilterConfig::default()).unwrap();
        let mut generator = SyntheticGenerator::new(SyntheticConfig::seeded(3)).unwrap();
        let acquisition = generator.generate(2, 500).unwrap();

        let mut counting = Counting::default();
        let tensor = pipeline.process(&acquisition, &mut counting).unwrap();
        assert_eq!(tensor.dim(), (2, 55, 1));
        assert!(tensor.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert_eq!((counting.raw, counting.filtered, counting.bands, counting.spectra), (2, 2, 2, 2));
    }

    #[test]
    fn test_same_acquisition_same_tensor() {
        let mut pipeline = SignalPipeline::new(shape(), FilterConfig::default()).unwrap();
        let acquisition = SyntheticGenerator::new(SyntheticConfig::seeded(4))
            .unwrap()
            .generate(2, 500)
            .unwrap();
        let a = pipeline.process(&acquisition, &mut NullVisualizer).unwrap();
        let b = pipeline.process(&acquisition, &mut NullVisualizer).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut pipeline = SignalPipeline::new(shape(), FilterConfig::default()).unwrap();
        let acquisition = Acquisition::new(500.0, vec![vec![0.0; 500]; 3]).unwrap();
        let err = pipeline.process(&acquisition, &mut NullVisualizer).unwrap_err();
        assert!(matches!(err, TrainerError::Features(FeatureError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_too_short_for_filters() {
        let short = PipelineShape {
            channels: 1,
            samples: 20,
            sample_rate: 500.0,
        };
        assert!(matches!(
            SignalPipeline::new(short, FilterConfig::default()),
            Err(TrainerError::InvalidConfig(_))
        ));
        // Without zero-phase stages any length is accepted
        assert!(SignalPipeline::new(short, FilterConfig::passthrough()).is_ok());
    }
}
