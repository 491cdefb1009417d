//! Dataset persistence

use crate::StorageError;
use classifier::Dataset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Current archive layout version
const ARCHIVE_VERSION: u16 = 1;

/// Saves and loads collected datasets
pub trait DatasetStore {
    /// Persist a dataset, replacing any existing file
    fn save(&self, dataset: &Dataset, path: &Path) -> Result<(), StorageError>;

    /// Load a dataset; a missing file is `DatasetNotFound`
    fn load(&self, path: &Path) -> Result<Dataset, StorageError>;

    /// Whether a dataset exists at `path`
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[derive(Serialize)]
struct ArchiveRef<'a> {
    version: u16,
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct Archive {
    version: u16,
    dataset: Dataset,
}

/// Binary dataset store using postcard
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardDatasetStore;

impl PostcardDatasetStore {
    pub fn new() -> Self {
        Self
    }
}

impl DatasetStore for PostcardDatasetStore {
    fn save(&self, dataset: &Dataset, path: &Path) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(&ArchiveRef {
            version: ARCHIVE_VERSION,
            dataset,
        })
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        info!(
            "Saved dataset with {} samples to {} ({} bytes)",
            dataset.len(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Dataset, StorageError> {
        if !path.is_file() {
            return Err(StorageError::DatasetNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let archive: Archive =
            postcard::from_bytes(&bytes).map_err(|e| StorageError::SerializationError(e.to_string()))?;
        if archive.version != ARCHIVE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: archive.version,
                expected: ARCHIVE_VERSION,
            });
        }

        debug!("Loaded {} samples from {}", archive.dataset.len(), path.display());
        Ok(archive.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dataset = Dataset::new(vec!["forward".into(), "stop".into()]);
        for label in [0, 1, 1, 0] {
            let tensor = Array3::from_shape_fn((4, 55, 1), |_| rng.gen_range(0.0..1e6));
            dataset.push(tensor, label).unwrap();
        }
        dataset
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions").join("round_trip.bin");
        let store = PostcardDatasetStore::new();
        let original = dataset();

        store.save(&original, &path).unwrap();
        assert!(store.exists(&path));
        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.bin");
        let err = PostcardDatasetStore::new().load(&path).unwrap_err();
        assert!(matches!(err, StorageError::DatasetNotFound(p) if p == path));
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        fs::write(&path, [0xFFu8; 3]).unwrap();
        let err = PostcardDatasetStore::new().load(&path).unwrap_err();
        assert!(matches!(err, StorageError::SerializationError(_)));
    }
}
