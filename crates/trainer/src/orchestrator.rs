//! Training Orchestration

use crate::config::{DatasetSource, TrainerConfig};
use crate::pipeline::SignalPipeline;
use crate::visualizer::{NullVisualizer, Visualizer};
use crate::TrainerError;
use acquisition::SignalSource;
use classifier::{Classifier, ClassifierError, Dataset, LabelMap, Prediction, TrainedModel, TrainingHistory};
use feature_engine::FeatureTensor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::{DatasetStore, PostcardDatasetStore};
use tracing::{debug, info, warn};

/// Shared flag that aborts dataset collection
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collects datasets, trains the classifier and predicts commands
pub struct TrainingOrchestrator {
    config: TrainerConfig,
    labels: LabelMap,
    source: Box<dyn SignalSource>,
    pipeline: SignalPipeline,
    classifier: Classifier,
    store: Box<dyn DatasetStore>,
    visualizer: Box<dyn Visualizer>,
    cancel: CancellationToken,
}

impl TrainingOrchestrator {
    /// Create an orchestrator reading from `source`
    pub fn new(config: TrainerConfig, source: Box<dyn SignalSource>) -> Result<Self, TrainerError> {
        let labels = LabelMap::new(config.commands.iter().cloned())?;
        config.training.validate()?;
        if source.sample_rate() != config.shape.sample_rate {
            return Err(TrainerError::InvalidConfig(format!(
                "source samples at {} Hz but the pipeline expects {} Hz",
                source.sample_rate(),
                config.shape.sample_rate
            )));
        }
        let pipeline = SignalPipeline::new(config.shape, config.filter.clone())?;
        let classifier = Classifier::new(labels.clone(), config.shape.tensor_dim(), config.training.clone());

        info!(
            "Training orchestrator ready: {} commands, {} channels x {} samples @ {} Hz, {:?} mode",
            labels.len(),
            config.shape.channels,
            config.shape.samples,
            config.shape.sample_rate,
            config.mode
        );

        Ok(Self {
            config,
            labels,
            source,
            pipeline,
            classifier,
            store: Box::new(PostcardDatasetStore::new()),
            visualizer: Box::new(NullVisualizer),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the dataset store
    pub fn with_store(mut self, store: Box<dyn DatasetStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the visualizer
    pub fn with_visualizer(mut self, visualizer: Box<dyn Visualizer>) -> Self {
        self.visualizer = visualizer;
        self
    }

    /// Token that interrupts collection when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Configuration
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Classifier
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Acquire one acquisition and turn it into a feature tensor
    fn acquire_tensor(&mut self) -> Result<FeatureTensor, TrainerError> {
        let shape = self.pipeline.shape();
        let acquisition = self.source.get_signals(shape.channels, shape.samples)?;
        self.pipeline.process(&acquisition, &mut *self.visualizer)
    }

    /// Collect `samples_per_command` labelled tensors for every command
    pub fn collect(&mut self, samples_per_command: usize) -> Result<Dataset, TrainerError> {
        let mut dataset = Dataset::new(self.labels.commands().to_vec());
        for (label, command) in self.labels.commands().to_vec().into_iter().enumerate() {
            info!("Collecting {} samples for '{}'", samples_per_command, command);
            for i in 0..samples_per_command {
                if self.cancel.is_cancelled() {
                    warn!("Collection interrupted during '{}' ({} samples so far)", command, dataset.len());
                    return Err(TrainerError::Interrupted);
                }
                let tensor = self.acquire_tensor()?;
                dataset.push(tensor, label)?;
                debug!("'{}' sample {}/{}", command, i + 1, samples_per_command);
            }
        }
        info!("Collected {} samples", dataset.len());
        Ok(dataset)
    }

    /// Load or collect the dataset named by the configuration
    pub fn acquire_dataset(&mut self) -> Result<Dataset, TrainerError> {
        match self.config.dataset.clone() {
            DatasetSource::LoadFrom { path } => {
                info!("Loading dataset from {}", path.display());
                let dataset = self.store.load(&path)?;
                if dataset.commands() != self.labels.commands() {
                    return Err(TrainerError::CommandMismatch {
                        expected: self.labels.commands().to_vec(),
                        found: dataset.commands().to_vec(),
                    });
                }
                Ok(dataset)
            }
            DatasetSource::Collect {
                samples_per_command,
                save_to,
            } => {
                let dataset = self.collect(samples_per_command)?;
                if let Some(path) = save_to {
                    self.store.save(&dataset, &path)?;
                }
                Ok(dataset)
            }
        }
    }

    /// Train the classifier on a dataset
    pub fn train(&mut self, dataset: &Dataset) -> Result<TrainingHistory, TrainerError> {
        if dataset.commands() != self.labels.commands() {
            return Err(TrainerError::CommandMismatch {
                expected: self.labels.commands().to_vec(),
                found: dataset.commands().to_vec(),
            });
        }
        let set = dataset.to_training_set()?;
        Ok(self.classifier.train(&set)?)
    }

    /// Obtain the configured dataset and train on it
    pub fn run(&mut self) -> Result<TrainingHistory, TrainerError> {
        let dataset = self.acquire_dataset()?;
        self.train(&dataset)
    }

    /// Install a previously trained model
    pub fn install_model(&mut self, model: TrainedModel) -> Result<(), TrainerError> {
        if model.labels != self.labels {
            return Err(TrainerError::CommandMismatch {
                expected: self.labels.commands().to_vec(),
                found: model.labels.commands().to_vec(),
            });
        }
        if model.input_dim != self.config.shape.tensor_dim() {
            return Err(TrainerError::InvalidConfig(format!(
                "model expects tensors of {:?}, pipeline produces {:?}",
                model.input_dim,
                self.config.shape.tensor_dim()
            )));
        }
        self.classifier = Classifier::from_trained(model)?;
        Ok(())
    }

    /// Acquire one acquisition and predict its command
    pub fn predict_next(&mut self) -> Result<Prediction, TrainerError> {
        if !self.classifier.is_trained() {
            return Err(ClassifierError::NotTrained.into());
        }
        let tensor = self.acquire_tensor()?;
        let prediction = self.classifier.predict(&tensor)?;
        self.visualizer.prediction(&prediction);
        Ok(prediction)
    }
}
