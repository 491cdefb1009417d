//! Synthetic EEG generation
//!
//! Produces plausible multi-band signals for development without hardware
//! and for reproducible test fixtures.

use crate::{Acquisition, AcquisitionError, Band, SignalSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Shape of the generated channel signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Random amplitude and frequency per band, plus Gaussian noise
    #[default]
    RandomBands,
    /// Fixed sine per band, see [`pure_bands`]
    PureBands,
    /// Gaussian noise only, see [`gaussian_noise`]
    Noise,
    /// See [`square_wave`]
    Square,
    /// See [`template_signal`]
    Template,
}

/// Synthetic generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Signal shape
    pub waveform: Waveform,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
    /// Upper bound (exclusive) of each band component's amplitude (uV)
    pub max_amplitude: f64,
    /// Standard deviation of additive Gaussian noise (uV)
    pub noise_std_dev: f64,
    /// Seed for reproducible output; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::RandomBands,
            sample_rate: 500.0,
            max_amplitude: 9.0,
            noise_std_dev: 5.0,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    /// Default configuration with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

/// Generator of randomized five-band signals with Gaussian noise
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
    noise: Normal<f64>,
}

impl SyntheticGenerator {
    /// Create a generator
    pub fn new(config: SyntheticConfig) -> Result<Self, AcquisitionError> {
        if !config.sample_rate.is_finite() || config.sample_rate <= 0.0 {
            return Err(AcquisitionError::InvalidSampleRate(config.sample_rate));
        }
        if !config.max_amplitude.is_finite() || config.max_amplitude <= 0.0 {
            return Err(AcquisitionError::InvalidConfig(format!(
                "max amplitude must be positive, got {}",
                config.max_amplitude
            )));
        }
        if !config.noise_std_dev.is_finite() || config.noise_std_dev < 0.0 {
            return Err(AcquisitionError::InvalidConfig(format!(
                "noise standard deviation must be non-negative, got {}",
                config.noise_std_dev
            )));
        }
        let noise = Normal::new(0.0, config.noise_std_dev)
            .map_err(|e| AcquisitionError::InvalidConfig(format!("invalid noise distribution: {}", e)))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng, noise })
    }

    /// Generate one acquisition
    pub fn generate(&mut self, channel_count: usize, sample_count: usize) -> Result<Acquisition, AcquisitionError> {
        let fs = self.config.sample_rate;
        let channels = (0..channel_count)
            .map(|_| match self.config.waveform {
                Waveform::RandomBands => self.random_bands(sample_count),
                Waveform::PureBands => pure_bands(sample_count, fs),
                Waveform::Noise => gaussian_noise(sample_count, &mut self.rng),
                Waveform::Square => square_wave(sample_count, fs),
                Waveform::Template => template_signal(sample_count),
            })
            .collect();

        debug!(
            "Generated synthetic acquisition ({:?}): {} x {}",
            self.config.waveform, channel_count, sample_count
        );
        Acquisition::new(fs, channels)
    }

    fn random_bands(&mut self, sample_count: usize) -> Vec<f64> {
        let fs = self.config.sample_rate;
        let components: Vec<(f64, f64)> = Band::ALL
            .iter()
            .map(|band| {
                let (low, high) = band.range_hz();
                let amplitude = self.rng.gen_range(0.0..self.config.max_amplitude);
                let frequency = self.rng.gen_range(low..high);
                (amplitude, frequency)
            })
            .collect();

        (0..sample_count)
            .map(|i| {
                let t = i as f64 / fs;
                let clean: f64 = components
                    .iter()
                    .map(|(amp, freq)| amp * (2.0 * PI * freq * t).sin())
                    .sum();
                clean + self.noise.sample(&mut self.rng)
            })
            .collect()
    }
}

impl SignalSource for SyntheticGenerator {
    fn get_signals(
        &mut self,
        channel_count: usize,
        sample_count: usize,
    ) -> Result<Acquisition, AcquisitionError> {
        self.generate(channel_count, sample_count)
    }

    fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }
}

/// Deterministic reference signal: one pure sine per band.
///
/// Amplitudes/frequencies: alpha 1@10 Hz, beta 2@20 Hz, gamma 3@40 Hz,
/// delta 4@2 Hz, theta 5@5 Hz.
pub fn pure_bands(sample_count: usize, sample_rate: f64) -> Vec<f64> {
    const COMPONENTS: [(f64, f64); 5] = [(1.0, 10.0), (2.0, 20.0), (3.0, 40.0), (4.0, 2.0), (5.0, 5.0)];
    (0..sample_count)
        .map(|i| {
            let t = i as f64 / sample_rate;
            COMPONENTS
                .iter()
                .map(|(amp, freq)| amp * (2.0 * PI * freq * t).sin())
                .sum()
        })
        .collect()
}

/// Amplitude of [`square_wave`] (uV)
const SQUARE_AMPLITUDE: f64 = 3.0;
/// Frequency of [`square_wave`] (Hz)
const SQUARE_FREQUENCY: f64 = 10.0;

/// One period of a hand-drawn EEG-like trace
const TEMPLATE_PERIOD: [f64; 50] = [
    0.5, 0.4, 0.3, 0.2, 0.1, -0.1, -0.2, -0.3, -0.4, -0.5, //
    0.8, 0.7, 0.6, 0.5, 0.4, -0.4, -0.5, -0.6, -0.7, -0.8, //
    0.3, 0.2, 0.1, 0.0, -0.1, -0.2, -0.3, -0.4, -0.5, -0.6, //
    0.7, 0.6, 0.5, 0.4, 0.3, -0.3, -0.4, -0.5, -0.6, -0.7, //
    0.2, 0.1, 0.0, -0.1, -0.2, -0.3, -0.4, -0.5, -0.6, -0.7,
];

/// Zero-mean Gaussian noise with a 5 uV standard deviation
pub fn gaussian_noise<R: Rng>(sample_count: usize, rng: &mut R) -> Vec<f64> {
    (0..sample_count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            5.0 * z
        })
        .collect()
}

/// 10 Hz square wave of amplitude 3 uV
pub fn square_wave(sample_count: usize, sample_rate: f64) -> Vec<f64> {
    (0..sample_count)
        .map(|i| {
            let phase = (2.0 * PI * SQUARE_FREQUENCY * i as f64 / sample_rate).sin();
            if phase > 0.0 {
                SQUARE_AMPLITUDE
            } else if phase < 0.0 {
                -SQUARE_AMPLITUDE
            } else {
                0.0
            }
        })
        .collect()
}

/// A fixed 50-sample EEG-like template repeated to `sample_count` samples
pub fn template_signal(sample_count: usize) -> Vec<f64> {
    TEMPLATE_PERIOD.iter().copied().cycle().take(sample_count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let mut generator = SyntheticGenerator::new(SyntheticConfig::seeded(7)).unwrap();
        let acq = generator.generate(4, 1000).unwrap();
        assert_eq!(acq.channel_count(), 4);
        assert_eq!(acq.sample_count(), 1000);
        assert_eq!(acq.sample_rate(), 500.0);
    }

    #[test]
    fn test_seeded_generation_reproducible() {
        let mut a = SyntheticGenerator::new(SyntheticConfig::seeded(42)).unwrap();
        let mut b = SyntheticGenerator::new(SyntheticConfig::seeded(42)).unwrap();
        assert_eq!(a.generate(2, 200).unwrap(), b.generate(2, 200).unwrap());
    }

    #[test]
    fn test_amplitude_bounded_without_noise() {
        let config = SyntheticConfig {
            noise_std_dev: 0.0,
            seed: Some(3),
            ..Default::default()
        };
        let mut generator = SyntheticGenerator::new(config).unwrap();
        let acq = generator.generate(3, 500).unwrap();
        for channel in acq.channels() {
            assert!(channel.samples.iter().all(|v| v.abs() < 5.0 * 9.0));
        }
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let config = SyntheticConfig {
            max_amplitude: 0.0,
            ..SyntheticConfig::seeded(1)
        };
        assert!(matches!(
            SyntheticGenerator::new(config),
            Err(AcquisitionError::InvalidConfig(_))
        ));

        let config = SyntheticConfig {
            noise_std_dev: f64::NAN,
            ..SyntheticConfig::seeded(1)
        };
        assert!(matches!(
            SyntheticGenerator::new(config),
            Err(AcquisitionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fixed_waveforms_through_generator() {
        let config = SyntheticConfig {
            waveform: Waveform::Square,
            ..SyntheticConfig::seeded(4)
        };
        let acq = SyntheticGenerator::new(config).unwrap().generate(2, 300).unwrap();
        assert_eq!(acq.channels()[0].samples, square_wave(300, 500.0));
        assert_eq!(acq.channels()[1].samples, acq.channels()[0].samples);

        let config = SyntheticConfig {
            waveform: Waveform::PureBands,
            ..SyntheticConfig::seeded(4)
        };
        let acq = SyntheticGenerator::new(config).unwrap().generate(1, 300).unwrap();
        assert_eq!(acq.channels()[0].samples, pure_bands(300, 500.0));
    }

    #[test]
    fn test_square_wave_levels() {
        let signal = square_wave(500, 500.0);
        assert_eq!(signal[0], 0.0);
        // First half period positive, second negative
        assert_eq!(signal[10], 3.0);
        assert_eq!(signal[35], -3.0);
        assert!(signal.iter().all(|v| [-3.0, 0.0, 3.0].contains(v)));
    }

    #[test]
    fn test_template_signal_repeats() {
        let signal = template_signal(1020);
        assert_eq!(signal.len(), 1020);
        assert_eq!(&signal[..50], &signal[50..100]);
        assert_eq!(signal[10], 0.8);
        assert_eq!(signal[1000], 0.5);
    }

    #[test]
    fn test_gaussian_noise_spread() {
        let mut rng = StdRng::seed_from_u64(11);
        let noise = gaussian_noise(20_000, &mut rng);
        let mean = noise.iter().sum::<f64>() / noise.len() as f64;
        let var = noise.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / noise.len() as f64;
        assert!(mean.abs() < 0.2);
        assert!((var.sqrt() - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_pure_bands_starts_at_zero() {
        let signal = pure_bands(1000, 500.0);
        assert_eq!(signal.len(), 1000);
        assert!(signal[0].abs() < 1e-12);
        assert!(signal.iter().any(|v| v.abs() > 5.0));
    }
}
