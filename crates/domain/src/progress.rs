//! Per-user learning progress and the local/remote reconciliation policy.
//!
//! Persisted progress is untrusted: it may come from an older build, a
//! hand-edited file, or a partially written record. Deserialization therefore
//! degrades field by field - a malformed field falls back to its default
//! without poisoning the rest of the record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{BadgeId, NodeId, ScenarioId};

/// Highest score a scenario can record.
pub const MAX_SCORE: u8 = 100;

/// Lenient field decoder: any field that fails to deserialize is replaced by
/// its default instead of failing the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// The persisted per-user record of completed scenarios, badges, scores, and
/// last-visited node per scenario.
///
/// Sets enforce the no-duplicates invariant structurally; every mutator that
/// takes a score clamps it into `0..=MAX_SCORE`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProgress {
    #[serde(deserialize_with = "lenient")]
    pub completed_scenarios: BTreeSet<ScenarioId>,
    #[serde(deserialize_with = "lenient")]
    pub badges: BTreeSet<BadgeId>,
    #[serde(deserialize_with = "lenient")]
    pub current_scenario: Option<ScenarioId>,
    /// scenario id -> last rendered node id
    #[serde(deserialize_with = "lenient")]
    pub scenario_progress: BTreeMap<ScenarioId, NodeId>,
    /// scenario id -> score in 0..=100
    #[serde(deserialize_with = "lenient")]
    pub scores: BTreeMap<ScenarioId, u8>,
}

/// Which side of a local/remote pair should win, per the count heuristic.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// Local has more completed scenarios: push it to the remote as-is.
    LocalAhead,
    /// Remote has more completed scenarios: overwrite local with it.
    RemoteAhead,
    /// Equal counts: set-union record to persist on both sides.
    Merged(UserProgress),
}

impl UserProgress {
    /// Record a completed scenario. Idempotent; returns whether the id was
    /// newly added.
    pub fn mark_completed(&mut self, id: ScenarioId) -> bool {
        self.completed_scenarios.insert(id)
    }

    /// Award a badge. Idempotent.
    pub fn award_badge(&mut self, id: BadgeId) -> bool {
        self.badges.insert(id)
    }

    pub fn record_position(&mut self, scenario: ScenarioId, node: NodeId) {
        self.scenario_progress.insert(scenario, node);
    }

    pub fn record_score(&mut self, scenario: ScenarioId, score: u8) {
        self.scores.insert(scenario, score.min(MAX_SCORE));
    }

    pub fn is_completed(&self, id: &ScenarioId) -> bool {
        self.completed_scenarios.contains(id)
    }

    pub fn has_badge(&self, id: &BadgeId) -> bool {
        self.badges.contains(id)
    }

    pub fn position_in(&self, scenario: &ScenarioId) -> Option<&NodeId> {
        self.scenario_progress.get(scenario)
    }

    pub fn score_for(&self, scenario: &ScenarioId) -> Option<u8> {
        self.scores.get(scenario).copied()
    }

    /// Percentage of the catalog completed, rounded, clamped to `0..=100`.
    /// A zero-sized catalog reports 0 rather than dividing by zero.
    pub fn global_progress(&self, total_scenarios: usize) -> u8 {
        if total_scenarios == 0 {
            return 0;
        }
        let completed = self.completed_scenarios.len().min(total_scenarios);
        let percent = (completed * 100 + total_scenarios / 2) / total_scenarios;
        percent.min(100) as u8
    }

    /// Re-apply invariants to a record that arrived from outside (lenient
    /// decode keeps types right but not value ranges).
    pub fn normalize(&mut self) {
        for score in self.scores.values_mut() {
            *score = (*score).min(MAX_SCORE);
        }
    }

    /// Local/remote reconciliation heuristic.
    ///
    /// Whichever side completed more scenarios is considered ahead wholesale.
    /// On equal counts the completed and badge sets are unioned and local
    /// values win per-key for scores and node positions. This is an accepted
    /// approximation, not a CRDT: equal-count divergence keeps the unions but
    /// loses remote per-key precision.
    pub fn merge(local: &UserProgress, remote: &UserProgress) -> MergeOutcome {
        let local_count = local.completed_scenarios.len();
        let remote_count = remote.completed_scenarios.len();

        if local_count > remote_count {
            return MergeOutcome::LocalAhead;
        }
        if remote_count > local_count {
            return MergeOutcome::RemoteAhead;
        }

        let mut scores = remote.scores.clone();
        scores.extend(local.scores.clone());
        let mut scenario_progress = remote.scenario_progress.clone();
        scenario_progress.extend(local.scenario_progress.clone());

        MergeOutcome::Merged(UserProgress {
            completed_scenarios: local
                .completed_scenarios
                .union(&remote.completed_scenarios)
                .cloned()
                .collect(),
            badges: local.badges.union(&remote.badges).cloned().collect(),
            current_scenario: local.current_scenario.clone(),
            scenario_progress,
            scores,
        })
    }
}
