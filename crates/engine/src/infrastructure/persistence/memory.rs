//! In-memory persistence adapter for tests and the demo's ephemeral mode.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::infrastructure::ports::{ProgressRepo, ReminderRepo, StorageError};

/// Single-record store held in memory. Fresh instance per test gives the
/// "fresh store per session" the engine's no-locking assumption relies on.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    record: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw payload, e.g. a corrupt one for defensive
    /// read tests.
    pub fn with_record(raw: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(raw.into())),
        }
    }
}

#[async_trait]
impl ProgressRepo for InMemoryStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.lock().await.clone())
    }

    async fn save(&self, raw: &str) -> Result<(), StorageError> {
        *self.record.lock().await = Some(raw.to_string());
        Ok(())
    }
}

#[async_trait]
impl ReminderRepo for InMemoryStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.lock().await.clone())
    }

    async fn save(&self, raw: &str) -> Result<(), StorageError> {
        *self.record.lock().await = Some(raw.to_string());
        Ok(())
    }
}
