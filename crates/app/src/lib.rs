//! EEG Command Pipeline
//!
//! Operator entry point: resolves settings, builds the signal source, trains
//! (or reloads) the classifier and predicts wheelchair commands.

use acquisition::{ReplaySource, SignalSource, SyntheticConfig, SyntheticGenerator, Waveform};
use anyhow::{bail, Context, Result};
use classifier::{ClassifierError, Prediction};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storage::{ModelStore, StorageError};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use trainer::{AcquisitionMode, TracingVisualizer, TrainerConfig, TrainerError, TrainingOrchestrator};

/// Prefix of environment variables that override settings
pub const ENV_PREFIX: &str = "BCI";

/// Operator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Pipeline and training configuration
    pub trainer: TrainerConfig,
    /// Captured ADC stream replayed in hardware mode
    pub capture_path: Option<PathBuf>,
    /// Consecutive capture blocks averaged into one acquisition
    pub replay_epochs: usize,
    /// Signal shape produced in synthetic mode
    pub synthetic_waveform: Waveform,
    /// Seed for the synthetic generator; entropy when absent
    pub synthetic_seed: Option<u64>,
    /// Where the trained model is saved, and reloaded from
    pub model_path: Option<PathBuf>,
    /// Train even when a saved model exists
    pub retrain: bool,
    /// Number of acquisitions to classify after training
    pub predictions: usize,
    /// Up-sampling factor for band signal summaries
    pub resample_factor: Option<f64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            trainer: TrainerConfig::default(),
            capture_path: None,
            replay_epochs: 1,
            synthetic_waveform: Waveform::RandomBands,
            synthetic_seed: None,
            model_path: None,
            retrain: false,
            predictions: 1,
            resample_factor: None,
        }
    }
}

impl AppSettings {
    /// Resolve settings from an optional file plus `BCI_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `BCI_TRAINER__MODE=synthetic`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize::<AppSettings>()
            .context("Invalid settings")?;
        Ok(settings)
    }
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        warn!("Tracing subscriber already installed");
    }
}

/// Build the signal source for the configured mode
pub fn build_source(settings: &AppSettings) -> Result<Box<dyn SignalSource>> {
    let sample_rate = settings.trainer.shape.sample_rate;
    match settings.trainer.mode {
        AcquisitionMode::Synthetic => {
            let config = SyntheticConfig {
                waveform: settings.synthetic_waveform,
                sample_rate,
                seed: settings.synthetic_seed,
                ..SyntheticConfig::default()
            };
            Ok(Box::new(SyntheticGenerator::new(config)?))
        }
        AcquisitionMode::Hardware => {
            let Some(path) = &settings.capture_path else {
                bail!("Hardware mode needs capture_path pointing at a captured ADC stream");
            };
            let source = ReplaySource::open(path, sample_rate)
                .with_context(|| format!("Failed to open capture {}", path.display()))?
                .with_epoch_averaging(settings.replay_epochs);
            Ok(Box::new(source))
        }
    }
}

/// Reload a saved model unless retraining was requested
fn try_reload(orchestrator: &mut TrainingOrchestrator, settings: &AppSettings) -> Result<bool> {
    let Some(path) = settings.model_path.as_deref() else {
        return Ok(false);
    };
    if settings.retrain || !path.is_file() {
        return Ok(false);
    }
    let model = ModelStore::new().load(path)?;
    match orchestrator.install_model(model) {
        Ok(()) => {
            info!("Reloaded model from {}", path.display());
            Ok(true)
        }
        Err(e) => {
            warn!("Saved model at {} is unusable ({}); retraining", path.display(), e);
            Ok(false)
        }
    }
}

/// Train or reload, then classify `settings.predictions` acquisitions
pub fn run(settings: AppSettings) -> Result<Vec<Prediction>> {
    let source = build_source(&settings)?;
    let visualizer = match settings.resample_factor {
        Some(factor) => TracingVisualizer::with_resampling(factor),
        None => TracingVisualizer::new(),
    };
    let mut orchestrator =
        TrainingOrchestrator::new(settings.trainer.clone(), source)?.with_visualizer(Box::new(visualizer));

    if !try_reload(&mut orchestrator, &settings)? {
        let history = orchestrator.run()?;
        match history.best() {
            Some(best) => info!(
                "Training finished after {} epochs; kept epoch {} (train accuracy {:.1}%)",
                history.epochs.len(),
                best.epoch,
                best.train_accuracy * 100.0
            ),
            None => info!("Training finished after {} epochs", history.epochs.len()),
        }

        if let (Some(path), Some(model)) = (&settings.model_path, orchestrator.classifier().trained_model()) {
            ModelStore::new().save(model, path)?;
        }
    }

    let mut predictions = Vec::with_capacity(settings.predictions);
    for _ in 0..settings.predictions {
        predictions.push(orchestrator.predict_next()?);
    }
    Ok(predictions)
}

/// Operator-facing explanation for the failures they can act on
pub fn describe_failure(err: &anyhow::Error) -> Option<String> {
    match err.downcast_ref::<TrainerError>()? {
        TrainerError::Storage(StorageError::DatasetNotFound(path)) => Some(format!(
            "No saved dataset at {}. Collect one by setting trainer.dataset.kind = \"collect\".",
            path.display()
        )),
        TrainerError::Classifier(ClassifierError::NotTrained) => {
            Some("The classifier has not been trained yet; train it before predicting.".to_string())
        }
        TrainerError::Interrupted => Some("Collection was interrupted; nothing was saved.".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainer::DatasetSource;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.trainer.mode, AcquisitionMode::Hardware);
        assert_eq!(settings.predictions, 1);
        assert!(!settings.retrain);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let json = r#"{
            "trainer": { "mode": "synthetic", "dataset": { "kind": "load_from", "path": "set.bin" } },
            "predictions": 3,
            "synthetic_waveform": "square"
        }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.trainer.mode, AcquisitionMode::Synthetic);
        assert_eq!(settings.trainer.commands.len(), 6);
        assert_eq!(settings.trainer.shape.samples, 1000);
        assert_eq!(settings.predictions, 3);
        assert_eq!(settings.synthetic_waveform, Waveform::Square);
        assert_eq!(settings.replay_epochs, 1);
        assert_eq!(
            settings.trainer.dataset,
            DatasetSource::LoadFrom {
                path: PathBuf::from("set.bin")
            }
        );
    }

    #[test]
    fn test_hardware_mode_requires_capture() {
        let err = build_source(&AppSettings::default()).err().unwrap();
        assert!(err.to_string().contains("capture_path"));
    }

    #[test]
    fn test_synthetic_source_uses_pipeline_rate() {
        let mut settings = AppSettings::default();
        settings.trainer.mode = AcquisitionMode::Synthetic;
        settings.trainer.shape.sample_rate = 250.0;
        settings.synthetic_seed = Some(9);
        let source = build_source(&settings).unwrap();
        assert_eq!(source.sample_rate(), 250.0);
    }

    #[test]
    fn test_missing_dataset_is_described() {
        let err: anyhow::Error = TrainerError::Storage(StorageError::DatasetNotFound(PathBuf::from("x.bin"))).into();
        let message = describe_failure(&err).unwrap();
        assert!(message.contains("x.bin"));

        let err: anyhow::Error = TrainerError::Classifier(ClassifierError::NotTrained).into();
        assert!(describe_failure(&err).unwrap().contains("not been trained"));

        let other: anyhow::Error = TrainerError::ChannelDropped(0).into();
        assert!(describe_failure(&other).is_none());
    }
}
