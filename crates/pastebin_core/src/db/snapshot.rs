//! JSON array snapshots, one file per entity collection.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A collection snapshot rewritten in full after every mutation.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records, creating an empty `[]` file when none exists.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or does not hold a JSON array.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => {
                let records: Vec<T> = serde_json::from_str(&content).map_err(|err| {
                    tracing::error!("Failed to parse {}: {}", self.path.display(), err);
                    err
                })?;
                tracing::debug!("Loaded {} records from {}", records.len(), self.path.display());
                Ok(records)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                fs::write(&self.path, "[]")?;
                tracing::info!("Created empty snapshot {}", self.path.display());
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the snapshot with `records`.
    ///
    /// Writes a sibling temp file first and renames it over the target so a
    /// crash never leaves a truncated array behind.
    ///
    /// # Errors
    /// Returns an error when serialization or any filesystem step fails.
    pub fn write<T: Serialize>(&self, records: &[T]) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
