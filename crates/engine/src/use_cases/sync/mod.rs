//! Sync reconciler: merges local and remote progress snapshots.
//!
//! All remote work is gated on an authenticated identity; without one every
//! operation returns `SyncError::NoIdentity`, which callers on the learning
//! path treat as an expected no-op. This is the only component allowed to
//! surface explicit success/failure - and even then the completion path only
//! logs it.

use std::sync::Arc;

use chatling_domain::{MergeOutcome, UserProgress};

use crate::infrastructure::ports::{
    AuthPort, ClockPort, Identity, ProfileRecord, ProfileRepo, RemoteError,
};
use crate::stores::ProgressStore;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Nobody is signed in. Expected for anonymous sessions; callers skip
    /// silently.
    #[error("no authenticated identity, sync skipped")]
    NoIdentity,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Reconciles the local progress store with the remote profile service.
pub struct SyncService {
    store: Arc<ProgressStore>,
    remote: Arc<dyn ProfileRepo>,
    auth: Arc<dyn AuthPort>,
    clock: Arc<dyn ClockPort>,
}

impl SyncService {
    pub fn new(
        store: Arc<ProgressStore>,
        remote: Arc<dyn ProfileRepo>,
        auth: Arc<dyn AuthPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            store,
            remote,
            auth,
            clock,
        }
    }

    async fn identity(&self) -> Result<Identity, SyncError> {
        self.auth
            .current_identity()
            .await
            .ok_or(SyncError::NoIdentity)
    }

    /// Upload the full local snapshot, keyed by the signed-in identity.
    pub async fn push_local_to_remote(&self) -> Result<(), SyncError> {
        let identity = self.identity().await?;
        let local = self.store.get().await;
        let record = ProfileRecord::from_progress(&identity, &local, self.clock.now());
        self.remote.upsert(&record).await?;
        tracing::debug!(user = %identity.user_id, "local progress pushed to remote");
        Ok(())
    }

    /// Download the remote snapshot and overwrite the local store. No remote
    /// record yet is success (first-time user keeps local state).
    pub async fn pull_remote_to_local(&self) -> Result<(), SyncError> {
        let identity = self.identity().await?;
        match self.remote.fetch(identity.user_id).await? {
            Some(record) => {
                self.store.set(&record.into_progress()).await;
                tracing::debug!(user = %identity.user_id, "remote progress pulled to local");
            }
            None => {
                tracing::debug!(user = %identity.user_id, "no remote record yet, keeping local");
            }
        }
        Ok(())
    }

    /// Reconciliation pass: whichever side completed more scenarios wins
    /// wholesale; equal counts get the set-union merge, persisted on both
    /// sides. See `UserProgress::merge` for the accepted approximation.
    pub async fn merge(&self) -> Result<(), SyncError> {
        let identity = self.identity().await?;

        let Some(remote_record) = self.remote.fetch(identity.user_id).await? else {
            // Nothing remote to reconcile with - just upload local.
            return self.push_local_to_remote().await;
        };

        let local = self.store.get().await;
        let remote = remote_record.into_progress();

        match UserProgress::merge(&local, &remote) {
            MergeOutcome::LocalAhead => {
                tracing::info!("local progress is ahead, uploading");
                self.push_local_to_remote().await
            }
            MergeOutcome::RemoteAhead => {
                tracing::info!("remote progress is ahead, downloading");
                self.store.set(&remote).await;
                Ok(())
            }
            MergeOutcome::Merged(merged) => {
                tracing::info!("equal progress counts, persisting union on both sides");
                self.store.set(&merged).await;
                self.push_local_to_remote().await
            }
        }
    }

    /// Full merge pass after a successful sign-in. Errors are logged, never
    /// surfaced to the learner.
    pub async fn on_sign_in(&self) {
        match self.merge().await {
            Ok(()) => {}
            Err(SyncError::NoIdentity) => {
                tracing::debug!("sign-in sync skipped: no identity");
            }
            Err(e) => {
                tracing::warn!("sign-in sync failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::StaticAuth;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::infrastructure::ports::MockClockPort;
    use crate::infrastructure::remote::InMemoryProfileRepo;
    use chatling_domain::{ScenarioId, UserId};

    fn clock() -> Arc<MockClockPort> {
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(chrono::Utc::now);
        clock.expect_sleep().returning(|_| ());
        Arc::new(clock)
    }

    fn service(
        auth: StaticAuth,
        remote: Arc<InMemoryProfileRepo>,
    ) -> (Arc<ProgressStore>, SyncService) {
        let store = Arc::new(ProgressStore::new(Arc::new(InMemoryStore::new())));
        let service = SyncService::new(
            Arc::clone(&store),
            remote,
            Arc::new(auth),
            clock(),
        );
        (store, service)
    }

    fn completed(ids: &[&str]) -> UserProgress {
        let mut progress = UserProgress::default();
        for id in ids {
            progress.mark_completed(ScenarioId::from(*id));
        }
        progress
    }

    #[tokio::test]
    async fn push_without_identity_is_no_identity() {
        let (_store, service) = service(StaticAuth::anonymous(), Arc::new(InMemoryProfileRepo::new()));
        assert!(matches!(
            service.push_local_to_remote().await,
            Err(SyncError::NoIdentity)
        ));
    }

    #[tokio::test]
    async fn pull_with_no_remote_record_is_success() {
        let user = UserId::new();
        let (store, service) = service(
            StaticAuth::signed_in(user, None),
            Arc::new(InMemoryProfileRepo::new()),
        );
        store.set(&completed(&["a"])).await;

        service.pull_remote_to_local().await.unwrap();
        // Local untouched
        assert!(store.get().await.is_completed(&ScenarioId::from("a")));
    }

    #[tokio::test]
    async fn merge_pushes_when_local_is_ahead() {
        let user = UserId::new();
        let remote = Arc::new(InMemoryProfileRepo::new());
        let identity = Identity {
            user_id: user,
            email: None,
        };
        remote.seed(ProfileRecord::from_progress(
            &identity,
            &completed(&["a"]),
            chrono::Utc::now(),
        ));

        let (store, service) = service(StaticAuth::signed_in(user, None), Arc::clone(&remote));
        store.set(&completed(&["a", "b"])).await;

        service.merge().await.unwrap();

        let uploaded = remote.record(user).unwrap();
        assert_eq!(uploaded.completed_scenarios.len(), 2);
    }

    #[tokio::test]
    async fn merge_pulls_when_remote_is_ahead() {
        let user = UserId::new();
        let remote = Arc::new(InMemoryProfileRepo::new());
        let identity = Identity {
            user_id: user,
            email: None,
        };
        remote.seed(ProfileRecord::from_progress(
            &identity,
            &completed(&["a", "b", "c"]),
            chrono::Utc::now(),
        ));

        let (store, service) = service(StaticAuth::signed_in(user, None), Arc::clone(&remote));
        store.set(&completed(&["a"])).await;

        service.merge().await.unwrap();
        assert_eq!(store.get().await.completed_scenarios.len(), 3);
    }

    #[tokio::test]
    async fn merge_unions_on_equal_counts_and_pushes() {
        let user = UserId::new();
        let remote = Arc::new(InMemoryProfileRepo::new());
        let identity = Identity {
            user_id: user,
            email: None,
        };
        remote.seed(ProfileRecord::from_progress(
            &identity,
            &completed(&["c", "d"]),
            chrono::Utc::now(),
        ));

        let (store, service) = service(StaticAuth::signed_in(user, None), Arc::clone(&remote));
        store.set(&completed(&["a", "b"])).await;

        service.merge().await.unwrap();

        // Union property: both sides end with all four scenarios
        let local = store.get().await;
        assert_eq!(local.completed_scenarios.len(), 4);
        let uploaded = remote.record(user).unwrap();
        assert_eq!(uploaded.completed_scenarios.len(), 4);
    }

    #[tokio::test]
    async fn merge_with_empty_remote_uploads_local() {
        let user = UserId::new();
        let remote = Arc::new(InMemoryProfileRepo::new());
        let (store, service) = service(StaticAuth::signed_in(user, None), Arc::clone(&remote));
        store.set(&completed(&["a"])).await;

        service.merge().await.unwrap();
        assert!(remote.record(user).is_some());
    }
}
