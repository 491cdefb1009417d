//! Classifier state machine, training loop and prediction

use crate::dataset::TrainingSet;
use crate::labels::LabelMap;
use crate::network::{argmax, count_correct, cross_entropy, Adam, Mlp};
use crate::ClassifierError;
use feature_engine::{FeatureTensor, Scaler};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Training hyper-parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Hidden layer widths
    pub hidden_layers: Vec<usize>,
    /// Dropout rate after each hidden layer
    pub dropout: f64,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Maximum number of epochs
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Fraction of samples held out for validation
    pub validation_split: f64,
    /// Epochs without validation improvement before stopping
    pub patience: usize,
    /// Seed for shuffling, initialisation and dropout
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![128, 64],
            dropout: 0.5,
            learning_rate: 0.001,
            epochs: 100,
            batch_size: 32,
            validation_split: 0.2,
            patience: 10,
            seed: 42,
        }
    }
}

impl TrainConfig {
    /// Check hyper-parameter ranges
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ClassifierError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ClassifierError::InvalidConfig(format!(
                "validation split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.hidden_layers.contains(&0) {
            return Err(ClassifierError::InvalidConfig("hidden layers must have at least one unit".to_string()));
        }
        Ok(())
    }

    /// Short schedule for smoke tests and demos
    pub fn quick() -> Self {
        Self {
            epochs: 30,
            patience: 5,
            ..Default::default()
        }
    }
}

/// Metrics for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Per-epoch metrics of a training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
    /// Epoch whose parameters were kept
    pub best_epoch: usize,
    /// Whether training ended by early stopping
    pub stopped_early: bool,
}

impl TrainingHistory {
    /// Metrics of the kept epoch
    pub fn best(&self) -> Option<&EpochStats> {
        self.epochs.iter().find(|e| e.epoch == self.best_epoch)
    }
}

/// Everything needed to predict after training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub labels: LabelMap,
    /// Feature tensor shape the model accepts
    pub input_dim: (usize, usize, usize),
    pub network: Mlp,
    pub scaler: Scaler,
    pub history: TrainingHistory,
}

/// Result of a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted command name
    pub command: String,
    /// Predicted class index
    pub class_index: usize,
    /// Probability per class, in label order
    pub probabilities: Vec<f64>,
}

impl Prediction {
    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities.get(self.class_index).copied().unwrap_or(0.0)
    }
}

enum ClassifierState {
    Untrained,
    Trained(Box<TrainedModel>),
}

/// Command classifier, untrained until `train` succeeds
pub struct Classifier {
    labels: LabelMap,
    input_dim: (usize, usize, usize),
    config: TrainConfig,
    state: ClassifierState,
}

impl Classifier {
    /// Untrained classifier for tensors of `input_dim`
    pub fn new(labels: LabelMap, input_dim: (usize, usize, usize), config: TrainConfig) -> Self {
        info!(
            "Creating classifier: {} classes, input {:?}",
            labels.len(),
            input_dim
        );
        Self {
            labels,
            input_dim,
            config,
            state: ClassifierState::Untrained,
        }
    }

    /// Classifier restored from a trained model.
    ///
    /// The network, scaler and label map must agree with `input_dim`.
    pub fn from_trained(model: TrainedModel) -> Result<Self, ClassifierError> {
        let (channels, features, depth) = model.input_dim;
        let mismatch = |expected: String, actual: String| ClassifierError::InvalidInputShape { expected, actual };

        if channels == 0 || features == 0 || depth != 1 {
            return Err(mismatch("(channels, features, 1)".to_string(), format!("{:?}", model.input_dim)));
        }
        if !model.network.is_well_formed() {
            return Err(mismatch("chained network layers".to_string(), "inconsistent layer sizes".to_string()));
        }
        if model.network.input_len() != channels * features {
            return Err(mismatch(
                format!("network input of {}", channels * features),
                format!("network input of {}", model.network.input_len()),
            ));
        }
        if model.network.output_len() != model.labels.len() {
            return Err(mismatch(
                format!("{} classes", model.labels.len()),
                format!("network output of {}", model.network.output_len()),
            ));
        }
        if !model.scaler.is_well_formed() || model.scaler.columns() != features {
            return Err(mismatch(
                format!("scaler over {} columns", features),
                format!("scaler over {} columns", model.scaler.columns()),
            ));
        }

        info!("Restoring trained classifier ({} classes)", model.labels.len());
        Ok(Self {
            labels: model.labels.clone(),
            input_dim: model.input_dim,
            config: TrainConfig::default(),
            state: ClassifierState::Trained(Box::new(model)),
        })
    }

    /// Whether `predict` is available
    pub fn is_trained(&self) -> bool {
        matches!(self.state, ClassifierState::Trained(_))
    }

    /// Label map
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Accepted feature tensor shape
    pub fn input_dim(&self) -> (usize, usize, usize) {
        self.input_dim
    }

    /// Trained model, if any
    pub fn trained_model(&self) -> Option<&TrainedModel> {
        match &self.state {
            ClassifierState::Trained(model) => Some(model.as_ref()),
            ClassifierState::Untrained => None,
        }
    }

    fn check_shape(&self, tensor: &FeatureTensor) -> Result<(), ClassifierError> {
        if tensor.dim() != self.input_dim {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{:?}", self.input_dim),
                actual: format!("{:?}", tensor.dim()),
            });
        }
        Ok(())
    }

    /// Scaled, flattened network input rows for a set of tensors
    fn network_input(scaler: &Scaler, tensors: &[&FeatureTensor], width: usize) -> Result<Array2<f64>, ClassifierError> {
        let mut input = Array2::zeros((tensors.len(), width));
        for (mut row, tensor) in input.outer_iter_mut().zip(tensors) {
            let mut matrix = tensor.index_axis(Axis(2), 0).to_owned();
            scaler.transform_inplace(&mut matrix)?;
            for (slot, v) in row.iter_mut().zip(matrix.iter()) {
                *slot = *v;
            }
        }
        Ok(input)
    }

    /// Train on a one-hot training set, replacing any previous model
    pub fn train(&mut self, set: &TrainingSet) -> Result<TrainingHistory, ClassifierError> {
        self.config.validate()?;
        if set.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if set.class_count() != self.labels.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} classes", self.labels.len()),
                actual: format!("{} classes", set.class_count()),
            });
        }
        for tensor in set.features() {
            self.check_shape(tensor)?;
        }
        let (channels, features, _) = self.input_dim;
        if channels == 0 || features == 0 {
            return Err(ClassifierError::InvalidInputShape {
                expected: "non-empty tensor".to_string(),
                actual: format!("{:?}", self.input_dim),
            });
        }

        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);

        // Shuffle, then split off the validation partition
        let mut order: Vec<usize> = (0..set.len()).collect();
        order.shuffle(&mut rng);
        let val_count = ((set.len() as f64 * config.validation_split).round() as usize).min(set.len() - 1);
        let (val_idx, train_idx) = order.split_at(val_count);

        // Scaler fitted on training rows only
        let mut fit_rows = Array2::zeros((train_idx.len() * channels, features));
        for (mut chunk, &i) in fit_rows.axis_chunks_iter_mut(Axis(0), channels).zip(train_idx) {
            chunk.assign(&set.features()[i].index_axis(Axis(2), 0));
        }
        let scaler = Scaler::fit(fit_rows.view())?;

        let width = channels * features;
        let gather = |idx: &[usize]| -> Result<(Array2<f64>, Array2<f64>), ClassifierError> {
            let tensors: Vec<&FeatureTensor> = idx.iter().map(|&i| &set.features()[i]).collect();
            let x = Self::network_input(&scaler, &tensors, width)?;
            let y = set.targets().select(Axis(0), idx);
            Ok((x, y))
        };
        let (x_train, y_train) = gather(train_idx)?;
        let (x_val, y_val) = gather(val_idx)?;

        let mut network = Mlp::new(width, &config.hidden_layers, self.labels.len(), &mut rng);
        let mut optimizer = Adam::new(&network, config.learning_rate);
        let mut history = TrainingHistory::default();
        let mut best = (f64::INFINITY, network.clone());
        let mut stale = 0;
        let batch_size = config.batch_size.max(1);

        info!(
            "Training on {} samples ({} validation), {} epochs max",
            train_idx.len(),
            val_idx.len(),
            config.epochs
        );

        for epoch in 1..=config.epochs {
            let mut batch_order: Vec<usize> = (0..x_train.nrows()).collect();
            batch_order.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut correct = 0;
            for batch in batch_order.chunks(batch_size) {
                let xb = x_train.select(Axis(0), batch);
                let yb = y_train.select(Axis(0), batch);
                let (loss, hits) = network.train_batch(xb.view(), yb.view(), config.dropout, &mut optimizer, &mut rng);
                loss_sum += loss;
                correct += hits;
            }
            let train_loss = loss_sum / x_train.nrows() as f64;
            if !train_loss.is_finite() {
                return Err(ClassifierError::TrainingFailed(format!(
                    "loss diverged at epoch {}",
                    epoch
                )));
            }

            let (val_loss, val_accuracy) = if x_val.nrows() > 0 {
                let probs = network.predict(x_val.view());
                (
                    Some(cross_entropy(probs.view(), y_val.view())),
                    Some(count_correct(probs.view(), y_val.view()) as f64 / x_val.nrows() as f64),
                )
            } else {
                (None, None)
            };

            let stats = EpochStats {
                epoch,
                train_loss,
                train_accuracy: correct as f64 / x_train.nrows() as f64,
                val_loss,
                val_accuracy,
            };
            debug!("Epoch {}: {:?}", epoch, stats);
            history.epochs.push(stats);

            let monitored = val_loss.unwrap_or(train_loss);
            if monitored < best.0 {
                best = (monitored, network.clone());
                history.best_epoch = epoch;
                stale = 0;
            } else {
                stale += 1;
                if stale >= config.patience {
                    history.stopped_early = true;
                    info!("Early stopping at epoch {} (best {})", epoch, history.best_epoch);
                    break;
                }
            }
        }

        if history.best_epoch == 0 {
            return Err(ClassifierError::TrainingFailed("no epochs were run".to_string()));
        }

        info!(
            "Training complete: best epoch {}, monitored loss {:.4}",
            history.best_epoch, best.0
        );

        self.state = ClassifierState::Trained(Box::new(TrainedModel {
            labels: self.labels.clone(),
            input_dim: self.input_dim,
            network: best.1,
            scaler,
            history: history.clone(),
        }));
        Ok(history)
    }

    /// Predict the command for one feature tensor
    pub fn predict(&self, tensor: &FeatureTensor) -> Result<Prediction, ClassifierError> {
        let model = self.trained_model().ok_or(ClassifierError::NotTrained)?;
        self.check_shape(tensor)?;

        let (channels, features, _) = self.input_dim;
        let input = Self::network_input(&model.scaler, &[tensor], channels * features)?;
        let probabilities: Array1<f64> = model.network.predict(input.view()).row(0).to_owned();
        let class_index = argmax(probabilities.view());
        let command = self
            .labels
            .command(class_index)
            .ok_or(ClassifierError::InvalidLabel {
                label: class_index,
                classes: self.labels.len(),
            })?
            .to_string();

        debug!("Predicted {} (p={:.3})", command, probabilities[class_index]);
        Ok(Prediction {
            command,
            class_index,
            probabilities: probabilities.to_vec(),
        })
    }
}
