//! Repository port traits for local persistence.
//!
//! Local records travel as raw JSON strings so that corrupt payloads reach the
//! store's lenient decoder instead of failing inside the adapter.

use async_trait::async_trait;

use super::error::StorageError;

/// Persistence medium for the user progress record.
///
/// `load` returns `Ok(None)` when no record has ever been written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepo: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;
    async fn save(&self, raw: &str) -> Result<(), StorageError>;
}

/// Persistence medium for the registration reminder state.
///
/// Kept as its own record beside the progress blob so reminder bookkeeping
/// never races the progress store's read-modify-write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderRepo: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StorageError>;
    async fn save(&self, raw: &str) -> Result<(), StorageError>;
}
