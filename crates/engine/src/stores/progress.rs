//! The progress store: sole writer of the persisted user progress record.
//!
//! Every component reads and writes through this one instance (constructed at
//! session start and passed by reference), so the "single session, no
//! cross-process locking" assumption stays auditable. Failure policy per the
//! error-handling design: reads degrade to defaults, writes log and swallow -
//! loss of durability must never crash the interactive session.

use std::sync::Arc;

use chatling_domain::UserProgress;

use crate::infrastructure::ports::{ProgressRepo, StorageError};

pub struct ProgressStore {
    repo: Arc<dyn ProgressRepo>,
    /// Serializes read-modify-write cycles within this store instance.
    /// Not cross-process safe; cross-device divergence is the sync
    /// reconciler's problem, not this lock's.
    write_lock: tokio::sync::Mutex<()>,
}

impl ProgressStore {
    pub fn new(repo: Arc<dyn ProgressRepo>) -> Self {
        Self {
            repo,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Current state, defensively normalized. Missing, unreadable, or corrupt
    /// persisted data degrades to the default record - this never fails.
    pub async fn get(&self) -> UserProgress {
        match self.repo.load().await {
            Ok(Some(raw)) => match serde_json::from_str::<UserProgress>(&raw) {
                Ok(mut progress) => {
                    progress.normalize();
                    progress
                }
                Err(e) => {
                    tracing::warn!("corrupt progress record, using defaults: {}", e);
                    UserProgress::default()
                }
            },
            Ok(None) => UserProgress::default(),
            Err(e) => {
                tracing::warn!("progress store unreadable, using defaults: {}", e);
                UserProgress::default()
            }
        }
    }

    /// Persist the full state, replacing any prior record. Persistence-medium
    /// errors are logged, not propagated.
    pub async fn set(&self, state: &UserProgress) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    "failed to persist progress record: {}",
                    StorageError::serialization(e)
                );
                return;
            }
        };
        if let Err(e) = self.repo.save(&raw).await {
            tracing::warn!("failed to persist progress record: {}", e);
        }
    }

    /// Atomic read-modify-write relative to this store instance.
    pub async fn update<F>(&self, f: F) -> UserProgress
    where
        F: FnOnce(UserProgress) -> UserProgress,
    {
        let _guard = self.write_lock.lock().await;
        let next = f(self.get().await);
        self.set(&next).await;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::infrastructure::ports::{MockProgressRepo, StorageError};
    use chatling_domain::ScenarioId;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = ProgressStore::new(Arc::new(InMemoryStore::new()));

        let mut state = UserProgress::default();
        state.mark_completed(ScenarioId::from("intro-ia"));
        state.record_score(ScenarioId::from("intro-ia"), 80);

        store.set(&state).await;
        assert_eq!(store.get().await, state);
    }

    #[tokio::test]
    async fn corrupt_record_degrades_to_defaults() {
        let store = ProgressStore::new(Arc::new(InMemoryStore::with_record("not json at all")));
        assert_eq!(store.get().await, UserProgress::default());
    }

    #[tokio::test]
    async fn partially_corrupt_record_keeps_good_fields() {
        let raw = r#"{"completedScenarios":["a"],"scores":"oops"}"#;
        let store = ProgressStore::new(Arc::new(InMemoryStore::with_record(raw)));

        let progress = store.get().await;
        assert!(progress.is_completed(&ScenarioId::from("a")));
        assert!(progress.scores.is_empty());
    }

    #[tokio::test]
    async fn unreadable_medium_degrades_to_defaults() {
        let mut repo = MockProgressRepo::new();
        repo.expect_load()
            .returning(|| Err(StorageError::io("read", "disk on fire")));
        let store = ProgressStore::new(Arc::new(repo));
        assert_eq!(store.get().await, UserProgress::default());
    }

    #[tokio::test]
    async fn write_failure_is_swallowed() {
        let mut repo = MockProgressRepo::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save()
            .returning(|_| Err(StorageError::io("write", "read-only fs")));

        let store = ProgressStore::new(Arc::new(repo));
        // Must not panic or surface the failure
        let next = store
            .update(|mut p| {
                p.mark_completed(ScenarioId::from("intro-ia"));
                p
            })
            .await;
        assert!(next.is_completed(&ScenarioId::from("intro-ia")));
    }

    #[tokio::test]
    async fn update_applies_on_top_of_persisted_state() {
        let store = ProgressStore::new(Arc::new(InMemoryStore::new()));

        store
            .update(|mut p| {
                p.mark_completed(ScenarioId::from("a"));
                p
            })
            .await;
        let next = store
            .update(|mut p| {
                p.mark_completed(ScenarioId::from("b"));
                p
            })
            .await;

        assert_eq!(next.completed_scenarios.len(), 2);
    }
}
