//! Trained model snapshots

use crate::StorageError;
use classifier::TrainedModel;
use std::fs;
use std::path::Path;
use tracing::info;

/// Saves and loads trained models as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelStore;

impl ModelStore {
    pub fn new() -> Self {
        Self
    }

    /// Write a model snapshot
    pub fn save(&self, model: &TrainedModel, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_vec(model).map_err(|e| StorageError::SerializationError(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        info!("Saved model ({} classes) to {}", model.labels.len(), path.display());
        Ok(())
    }

    /// Read a model snapshot
    pub fn load(&self, path: &Path) -> Result<TrainedModel, StorageError> {
        if !path.is_file() {
            return Err(StorageError::ModelNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classifier::{Classifier, Dataset, LabelMap, TrainConfig};
    use ndarray::Array3;
    use tempfile::tempdir;

    #[test]
    fn test_model_round_trip() {
        let labels = LabelMap::new(["a", "b"]).unwrap();
        let mut dataset = Dataset::new(labels.commands().to_vec());
        for i in 0..6 {
            dataset.push(Array3::from_elem((1, 3, 1), (i % 2) as f64 * 4.0 + i as f64 * 0.1), i % 2).unwrap();
        }
        let config = TrainConfig {
            hidden_layers: vec![4],
            epochs: 3,
            ..Default::default()
        };
        let mut classifier = Classifier::new(labels, (1, 3, 1), config);
        classifier.train(&dataset.to_training_set().unwrap()).unwrap();
        let model = classifier.trained_model().unwrap().clone();

        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("model.json");
        let store = ModelStore::new();
        store.save(&model, &path).unwrap();
        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded.labels, model.labels);
        assert_eq!(loaded.input_dim, model.input_dim);

        let query = Array3::from_elem((1, 3, 1), 2.0);
        let a = Classifier::from_trained(model).unwrap().predict(&query).unwrap();
        let b = Classifier::from_trained(loaded).unwrap().predict(&query).unwrap();
        assert_eq!(a.class_index, b.class_index);
        for (x, y) in a.probabilities.iter().zip(&b.probabilities) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_model() {
        let err = ModelStore::new().load(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, StorageError::ModelNotFound(_)));
    }
}
