//! External service port traits (remote profile store, authentication).

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chatling_domain::{BadgeId, NodeId, ScenarioId, UserId, UserProgress};

use super::error::RemoteError;

// =============================================================================
// Remote Profile Types
// =============================================================================

/// One user's progress as stored by the remote profile service.
///
/// A consolidated profile blob rather than row-per-scenario: the reconciler
/// always pushes and pulls whole snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub completed_scenarios: Vec<ScenarioId>,
    #[serde(default)]
    pub badges: Vec<BadgeId>,
    #[serde(default)]
    pub scores: BTreeMap<ScenarioId, u8>,
    #[serde(default)]
    pub scenario_progress: BTreeMap<ScenarioId, NodeId>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    /// Snapshot the local progress record for upload.
    pub fn from_progress(
        identity: &Identity,
        progress: &UserProgress,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email.clone(),
            completed_scenarios: progress.completed_scenarios.iter().cloned().collect(),
            badges: progress.badges.iter().cloned().collect(),
            scores: progress.scores.clone(),
            scenario_progress: progress.scenario_progress.clone(),
            updated_at,
        }
    }

    /// Rebuild a progress record from a downloaded profile.
    ///
    /// Remote data is as untrusted as local data: collecting the Vec fields
    /// into sets drops duplicates, and scores re-clamp via `normalize`.
    pub fn into_progress(self) -> UserProgress {
        let mut progress = UserProgress {
            completed_scenarios: self.completed_scenarios.into_iter().collect(),
            badges: self.badges.into_iter().collect(),
            current_scenario: None,
            scenario_progress: self.scenario_progress,
            scores: self.scores,
        };
        progress.normalize();
        progress
    }
}

/// Remote progress service, queried/upserted by the sync reconciler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    /// Fetch the profile for a user. `Ok(None)` means no record yet
    /// (first-time user), which callers treat as success.
    async fn fetch(&self, user_id: UserId) -> Result<Option<ProfileRecord>, RemoteError>;

    /// Insert or replace the profile for `record.user_id`.
    async fn upsert(&self, record: &ProfileRecord) -> Result<(), RemoteError>;
}

// =============================================================================
// Authentication
// =============================================================================

/// A signed-in user as reported by the authentication provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// Authentication provider: supplies "is a session active" plus the stable
/// user identifier the reconciler keys remote records on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// `None` when nobody is signed in. Unauthenticated is an expected,
    /// non-error condition - sync silently no-ops on it.
    async fn current_identity(&self) -> Option<Identity>;
}
