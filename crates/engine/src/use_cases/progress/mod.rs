//! Progress use cases: scoring, badges, unlock checks, global percentage.

use std::sync::Arc;

use chatling_domain::{BadgeId, Scenario, ScenarioId, UserProgress};

use crate::stores::ProgressStore;
use crate::use_cases::sync::{SyncError, SyncService};

pub struct ProgressUseCases {
    store: Arc<ProgressStore>,
    sync: Arc<SyncService>,
}

impl ProgressUseCases {
    pub fn new(store: Arc<ProgressStore>, sync: Arc<SyncService>) -> Self {
        Self { store, sync }
    }

    pub async fn state(&self) -> UserProgress {
        self.store.get().await
    }

    /// Record a finished scenario with its quiz score, then trigger a
    /// fire-and-forget cloud sync.
    pub async fn finish_scenario(&self, scenario_id: ScenarioId, score: u8) -> UserProgress {
        let next = self
            .store
            .update({
                let scenario_id = scenario_id.clone();
                move |mut p| {
                    p.mark_completed(scenario_id.clone());
                    p.record_score(scenario_id, score);
                    p
                }
            })
            .await;

        let sync = Arc::clone(&self.sync);
        tokio::spawn(async move {
            match sync.push_local_to_remote().await {
                Ok(()) | Err(SyncError::NoIdentity) => {}
                Err(e) => tracing::warn!("cloud sync after finish failed: {}", e),
            }
        });

        next
    }

    pub async fn award_badge(&self, badge_id: BadgeId) -> UserProgress {
        self.store
            .update(move |mut p| {
                p.award_badge(badge_id);
                p
            })
            .await
    }

    /// Unlock check against the learner's current badge set.
    pub async fn is_unlocked(&self, scenario: &Scenario) -> bool {
        scenario.is_unlocked(&self.store.get().await.badges)
    }

    pub async fn is_scenario_completed(&self, id: &ScenarioId) -> bool {
        self.store.get().await.is_completed(id)
    }

    pub async fn has_badge(&self, id: &BadgeId) -> bool {
        self.store.get().await.has_badge(id)
    }

    /// Percentage of the catalog completed, clamped to 0..=100.
    pub async fn global_progress(&self, total_scenarios: usize) -> u8 {
        self.store.get().await.global_progress(total_scenarios)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::StaticAuth;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::infrastructure::ports::MockClockPort;
    use crate::infrastructure::remote::InMemoryProfileRepo;

    fn use_cases() -> ProgressUseCases {
        let store = Arc::new(ProgressStore::new(Arc::new(InMemoryStore::new())));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(chrono::Utc::now);
        clock.expect_sleep().returning(|_| ());
        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            Arc::new(InMemoryProfileRepo::new()),
            Arc::new(StaticAuth::anonymous()),
            Arc::new(clock),
        ));
        ProgressUseCases::new(store, sync)
    }

    #[tokio::test]
    async fn finish_scenario_records_completion_and_clamped_score() {
        let use_cases = use_cases();
        let state = use_cases
            .finish_scenario(ScenarioId::from("intro-ia"), 250)
            .await;
        assert!(state.is_completed(&ScenarioId::from("intro-ia")));
        assert_eq!(state.score_for(&ScenarioId::from("intro-ia")), Some(100));
    }

    #[tokio::test]
    async fn finishing_twice_keeps_one_completion() {
        let use_cases = use_cases();
        use_cases.finish_scenario(ScenarioId::from("a"), 80).await;
        let state = use_cases.finish_scenario(ScenarioId::from("a"), 90).await;
        assert_eq!(state.completed_scenarios.len(), 1);
        // Latest score wins
        assert_eq!(state.score_for(&ScenarioId::from("a")), Some(90));
    }

    #[tokio::test]
    async fn global_progress_is_percentage_of_catalog() {
        let use_cases = use_cases();
        use_cases.finish_scenario(ScenarioId::from("a"), 100).await;
        use_cases.finish_scenario(ScenarioId::from("b"), 100).await;

        assert_eq!(use_cases.global_progress(4).await, 50);
        assert_eq!(use_cases.global_progress(0).await, 0);
    }
}
