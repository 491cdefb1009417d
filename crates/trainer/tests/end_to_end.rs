//! Synthetic collect -> train -> predict, and training from a saved dataset

use acquisition::{SyntheticConfig, SyntheticGenerator};
use classifier::DEFAULT_COMMANDS;
use tempfile::tempdir;
use trainer::{DatasetSource, TracingVisualizer, TrainerConfig, TrainingOrchestrator};

fn synthetic_config(dataset: DatasetSource) -> TrainerConfig {
    TrainerConfig {
        dataset,
        ..TrainerConfig::synthetic()
    }
}

fn generator(seed: u64) -> Box<SyntheticGenerator> {
    Box::new(SyntheticGenerator::new(SyntheticConfig::seeded(seed)).unwrap())
}

#[test]
fn test_collect_train_predict() {
    let dir = tempdir().unwrap();
    let save_to = dir.path().join("collected.bin");
    let config = synthetic_config(DatasetSource::Collect {
        samples_per_command: 5,
        save_to: Some(save_to.clone()),
    });
    assert_eq!(config.shape.channels, 4);
    assert_eq!(config.shape.samples, 1000);
    assert_eq!(config.shape.sample_rate, 500.0);

    let mut orchestrator = TrainingOrchestrator::new(config, generator(42))
        .unwrap()
        .with_visualizer(Box::new(TracingVisualizer::new()));

    let history = orchestrator.run().unwrap();
    assert!(!history.epochs.is_empty());
    assert!(orchestrator.classifier().is_trained());

    let prediction = orchestrator.predict_next().unwrap();
    assert!(DEFAULT_COMMANDS.contains(&prediction.command.as_str()));
    assert_eq!(prediction.probabilities.len(), 6);
    assert!((prediction.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    // The collected dataset was persisted and trains a fresh orchestrator
    assert!(save_to.is_file());
    let mut reloaded = TrainingOrchestrator::new(
        synthetic_config(DatasetSource::LoadFrom { path: save_to.clone() }),
        generator(7),
    )
    .unwrap();
    let dataset = reloaded.acquire_dataset().unwrap();
    assert_eq!(dataset.len(), 30);
    assert_eq!(dataset.tensor_dim(), Some((4, 55, 1)));
    reloaded.train(&dataset).unwrap();
    assert!(reloaded.predict_next().is_ok());
}

#[test]
fn test_missing_dataset_is_reported() {
    let dir = tempdir().unwrap();
    let config = synthetic_config(DatasetSource::LoadFrom {
        path: dir.path().join("never_written.bin"),
    });
    let mut orchestrator = TrainingOrchestrator::new(config, generator(1)).unwrap();
    let err = orchestrator.run().unwrap_err();
    assert!(err.to_string().contains("No dataset found"));
    assert!(!orchestrator.classifier().is_trained());
}
