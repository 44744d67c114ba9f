//! Registration reminder: periodic nudges for anonymous learners.
//!
//! Shows a "save your progress" prompt every couple of completed scenarios
//! while nobody is signed in. The state is its own small persisted record;
//! the same storage failure policy as progress applies (degrade, log, never
//! block the session).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{AuthPort, ClockPort, ReminderRepo, StorageError};

/// Show the reminder every this many completed scenarios.
pub const SCENARIOS_BEFORE_REMINDER: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReminderState {
    pub scenarios_completed: u32,
    pub last_reminder_shown: Option<DateTime<Utc>>,
    pub reminders_dismissed: u32,
}

pub struct ReminderService {
    repo: Arc<dyn ReminderRepo>,
    auth: Arc<dyn AuthPort>,
    clock: Arc<dyn ClockPort>,
}

impl ReminderService {
    pub fn new(
        repo: Arc<dyn ReminderRepo>,
        auth: Arc<dyn AuthPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self { repo, auth, clock }
    }

    pub async fn state(&self) -> ReminderState {
        match self.repo.load().await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("corrupt reminder record, using defaults: {}", e);
                ReminderState::default()
            }),
            Ok(None) => ReminderState::default(),
            Err(e) => {
                tracing::warn!("reminder store unreadable, using defaults: {}", e);
                ReminderState::default()
            }
        }
    }

    async fn set_state(&self, state: &ReminderState) {
        match serde_json::to_string(state) {
            Ok(raw) => {
                if let Err(e) = self.repo.save(&raw).await {
                    tracing::warn!("failed to persist reminder state: {}", e);
                }
            }
            Err(e) => tracing::error!(
                "failed to persist reminder state: {}",
                StorageError::serialization(e)
            ),
        }
    }

    /// Whether to show the reminder now: never for signed-in users, otherwise
    /// at every `SCENARIOS_BEFORE_REMINDER` completions.
    pub async fn should_show(&self) -> bool {
        if self.auth.current_identity().await.is_some() {
            return false;
        }
        let state = self.state().await;
        state.scenarios_completed > 0
            && state.scenarios_completed % SCENARIOS_BEFORE_REMINDER == 0
    }

    pub async fn on_scenario_completed(&self) {
        let mut state = self.state().await;
        state.scenarios_completed += 1;
        self.set_state(&state).await;
    }

    pub async fn on_shown(&self) {
        let mut state = self.state().await;
        state.last_reminder_shown = Some(self.clock.now());
        self.set_state(&state).await;
    }

    pub async fn on_dismissed(&self) {
        let mut state = self.state().await;
        state.reminders_dismissed += 1;
        self.set_state(&state).await;
    }
}
