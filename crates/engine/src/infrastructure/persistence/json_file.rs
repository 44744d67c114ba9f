//! JSON-file persistence adapter.
//!
//! One record per file. Writes go through a temp file plus rename so a crash
//! mid-write leaves the previous record intact rather than a torn one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::infrastructure::ports::{ProgressRepo, ReminderRepo, StorageError};

/// File-backed store for a single raw JSON record.
///
/// Implements both local persistence ports; construct one instance per record
/// (progress and reminder state live in separate files).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io("read", e)),
        }
    }

    async fn write_raw(&self, raw: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io("create_dir", e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StorageError::io("write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::io("rename", e))?;
        Ok(())
    }
}

#[async_trait]
impl ProgressRepo for JsonFileStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        self.read_raw().await
    }

    async fn save(&self, raw: &str) -> Result<(), StorageError> {
        self.write_raw(raw).await
    }
}

#[async_trait]
impl ReminderRepo for JsonFileStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        self.read_raw().await
    }

    async fn save(&self, raw: &str) -> Result<(), StorageError> {
        self.write_raw(raw).await
    }
}
