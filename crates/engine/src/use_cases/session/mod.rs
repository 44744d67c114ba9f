//! Dialogue graph walker: one active scenario session.
//!
//! The walker steps through a scenario's node graph one node at a time,
//! driven by learner choices or the continue affordance. Each step emits
//! presentation events, persists the position through the progress store's
//! atomic update, and fires node actions. Reaching a terminal node runs the
//! completion sequence.
//!
//! Ordering guarantee on completion: local state is persisted and the quiz
//! trigger emitted before any cloud sync attempt is even initiated; the sync
//! itself runs after a short grace period, fire-and-forget.

use std::sync::Arc;
use std::time::Duration;

use chatling_domain::{NodeFlow, NodeId, Scenario, Sender};

use crate::events::{EventBus, SessionEvent};
use crate::infrastructure::ports::ClockPort;
use crate::stores::ProgressStore;
use crate::use_cases::sync::{SyncError, SyncService};

/// Delay before the post-completion cloud sync starts, so it never interrupts
/// the completion-message/quiz-trigger sequence.
pub const SYNC_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// What the learner can do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Affordance {
    /// Pick one of the current node's choices.
    Choices(Vec<chatling_domain::Choice>),
    /// Single auto-advance edge behind a "continue" affordance.
    Continue(NodeId),
    /// Terminal reached (or the walk halted defensively); no further input.
    Finished,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("choice index {index} out of range ({available} available)")]
    InvalidChoice { index: usize, available: usize },

    #[error("session is not awaiting a choice")]
    NotAwaitingChoice,

    #[error("session is not awaiting continue")]
    NotAwaitingContinue,
}

/// One learner's walk through one scenario.
///
/// Holds a transient session over the shared progress store; every mutation
/// goes through `ProgressStore::update` rather than caching state across
/// steps.
pub struct ScenarioSession {
    scenario: Arc<Scenario>,
    store: Arc<ProgressStore>,
    events: EventBus,
    sync: Arc<SyncService>,
    clock: Arc<dyn ClockPort>,
    affordance: Affordance,
}

impl ScenarioSession {
    pub fn new(
        scenario: Arc<Scenario>,
        store: Arc<ProgressStore>,
        events: EventBus,
        sync: Arc<SyncService>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            scenario,
            store,
            events,
            sync,
            clock,
            affordance: Affordance::Finished,
        }
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    /// What the learner can do next.
    pub fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.affordance, Affordance::Finished)
    }

    /// Begin the walk: resume from the saved node for this scenario when one
    /// exists and still resolves, otherwise start at the initial node.
    ///
    /// Prior messages are not replayed on resume - a known, accepted UX gap.
    pub async fn start_or_resume(&mut self) {
        let scenario_id = self.scenario.id.clone();
        let progress = self
            .store
            .update(|mut p| {
                p.current_scenario = Some(scenario_id.clone());
                p
            })
            .await;

        let start = match progress.position_in(&self.scenario.id) {
            Some(saved) if self.scenario.node(saved).is_some() => saved.clone(),
            _ => self.scenario.initial_node_id.clone(),
        };

        self.step(start).await;
    }

    /// Select choice `index` on the current node. Echoes the chosen label as
    /// a learner message, then transitions to the choice's target.
    pub async fn choose(&mut self, index: usize) -> Result<(), SessionError> {
        let Affordance::Choices(choices) = &self.affordance else {
            return Err(SessionError::NotAwaitingChoice);
        };
        let choice = choices.get(index).ok_or(SessionError::InvalidChoice {
            index,
            available: choices.len(),
        })?;

        let label = choice.label.clone();
        let target = choice.next_node_id.clone();

        self.events
            .dispatch(SessionEvent::Message {
                sender: Sender::User,
                text: label,
            })
            .await;

        self.step(target).await;
        Ok(())
    }

    /// Follow the current node's single auto-advance edge.
    pub async fn advance(&mut self) -> Result<(), SessionError> {
        let Affordance::Continue(target) = &self.affordance else {
            return Err(SessionError::NotAwaitingContinue);
        };
        let target = target.clone();
        self.step(target).await;
        Ok(())
    }

    /// One transition of the walk. Revisiting a node (authored back-edges)
    /// is an independent transition; nothing is special-cased.
    async fn step(&mut self, node_id: NodeId) {
        let Some(node) = self.scenario.node(&node_id) else {
            // Unreachable content: halt the walk, don't crash the session.
            tracing::warn!(
                scenario = %self.scenario.id,
                node = %node_id,
                "node missing from scenario, halting walk"
            );
            self.affordance = Affordance::Finished;
            return;
        };
        let node = node.clone();

        self.events
            .dispatch(SessionEvent::Message {
                sender: node.sender,
                text: node.text.clone(),
            })
            .await;

        let scenario_id = self.scenario.id.clone();
        let position = node_id.clone();
        self.store
            .update(move |mut p| {
                p.record_position(scenario_id, position);
                p
            })
            .await;

        if let Some(action) = &node.action {
            let (tag, data) = action.to_wire();
            self.events
                .dispatch(SessionEvent::ActionTriggered {
                    scenario_id: self.scenario.id.clone(),
                    tag,
                    data,
                })
                .await;
        }

        match node.flow() {
            NodeFlow::Choices(choices) => {
                let choices = choices.to_vec();
                self.events
                    .dispatch(SessionEvent::ChoicesOffered {
                        choices: choices.clone(),
                    })
                    .await;
                self.affordance = Affordance::Choices(choices);
            }
            NodeFlow::Advance(next) => {
                self.affordance = Affordance::Continue(next.clone());
            }
            NodeFlow::Terminal => {
                self.complete().await;
                self.affordance = Affordance::Finished;
            }
        }
    }

    /// Scenario completion: record the completion and badge (both idempotent
    /// set inserts), emit the completion message and quiz trigger, then
    /// schedule the delayed fire-and-forget cloud sync.
    ///
    /// Re-reaching a terminal node in a finished scenario re-triggers the
    /// side effects but cannot duplicate state - acceptable by design.
    async fn complete(&mut self) {
        let scenario_id = self.scenario.id.clone();
        let badge_id = self.scenario.badge.id.clone();

        self.store
            .update({
                let scenario_id = scenario_id.clone();
                move |mut p| {
                    p.mark_completed(scenario_id);
                    p.award_badge(badge_id);
                    p.current_scenario = None;
                    p
                }
            })
            .await;

        self.events
            .dispatch(SessionEvent::Message {
                sender: Sender::System,
                text: "🎉 Mission complete".to_string(),
            })
            .await;
        self.events
            .dispatch(SessionEvent::ScenarioCompleted {
                scenario_id: scenario_id.clone(),
            })
            .await;
        self.events
            .dispatch(SessionEvent::QuizRequested {
                scenario_id: scenario_id.clone(),
            })
            .await;

        // State and quiz trigger are done; only now does the sync attempt
        // get scheduled. Failures are logged, never surfaced to the learner.
        let sync = Arc::clone(&self.sync);
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            clock.sleep(SYNC_GRACE_PERIOD).await;
            match sync.push_local_to_remote().await {
                Ok(()) => {}
                Err(SyncError::NoIdentity) => {
                    tracing::debug!("post-completion sync skipped: not signed in");
                }
                Err(e) => {
                    tracing::warn!(scenario = %scenario_id, "post-completion sync failed: {}", e);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chatling_domain::{
        Badge, BadgeId, Choice, ChoiceStyle, DialogueNode, Difficulty, Language, ScenarioId,
    };

    use crate::infrastructure::auth::StaticAuth;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::infrastructure::ports::MockClockPort;
    use crate::infrastructure::remote::InMemoryProfileRepo;

    fn node(id: &str, text: &str) -> DialogueNode {
        DialogueNode {
            id: NodeId::from(id),
            sender: Sender::Narrator,
            text: text.into(),
            next_node_id: None,
            options: Vec::new(),
            action: None,
        }
    }

    fn choice(label: &str, target: &str) -> Choice {
        Choice {
            label: label.into(),
            next_node_id: NodeId::from(target),
            style: ChoiceStyle::Default,
        }
    }

    /// n1 --yes--> n2 -> end, n1 --no--> n3 (terminal)
    fn fixture_scenario() -> Arc<Scenario> {
        let mut nodes = HashMap::new();
        let mut n1 = node("n1", "Shall we?");
        n1.options = vec![choice("yes", "n2"), choice("no", "n3")];
        nodes.insert(NodeId::from("n1"), n1);

        let mut n2 = node("n2", "Onwards");
        n2.next_node_id = Some(NodeId::from("end"));
        nodes.insert(NodeId::from("n2"), n2);

        nodes.insert(NodeId::from("n3"), node("n3", "Maybe later"));
        nodes.insert(NodeId::from("end"), node("end", "The end"));

        Arc::new(Scenario {
            id: ScenarioId::from("intro-ia"),
            title: "Intro".into(),
            description: String::new(),
            difficulty: Difficulty::Beginner,
            language: Language::En,
            required_badge_id: None,
            unlocks_scenario_id: None,
            badge: Badge {
                id: BadgeId::from("badge-explorer"),
                name: "Explorer".into(),
                icon: "X".into(),
                description: String::new(),
            },
            initial_node_id: NodeId::from("n1"),
            nodes,
            deep_mode: None,
            quiz: None,
        })
    }

    fn mock_clock() -> Arc<MockClockPort> {
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(chrono::Utc::now);
        clock.expect_sleep().returning(|_| ());
        Arc::new(clock)
    }

    async fn session_with_events(
        scenario: Arc<Scenario>,
    ) -> (ScenarioSession, Arc<ProgressStore>, Arc<Mutex<Vec<SessionEvent>>>) {
        let store = Arc::new(ProgressStore::new(Arc::new(InMemoryStore::new())));
        let events = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            events
                .subscribe(move |event| seen.lock().unwrap().push(event))
                .await;
        }
        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            Arc::new(InMemoryProfileRepo::new()),
            Arc::new(StaticAuth::anonymous()),
            mock_clock(),
        ));
        let session = ScenarioSession::new(scenario, Arc::clone(&store), events, sync, mock_clock());
        (session, store, seen)
    }

    #[tokio::test]
    async fn choosing_transitions_and_persists_position() {
        // Example C: two options, choosing index 0 lands on n2
        let (mut session, store, _seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;
        assert!(matches!(session.affordance(), Affordance::Choices(c) if c.len() == 2));

        session.choose(0).await.unwrap();

        let progress = store.get().await;
        assert_eq!(
            progress.position_in(&ScenarioId::from("intro-ia")),
            Some(&NodeId::from("n2"))
        );
        assert!(matches!(session.affordance(), Affordance::Continue(n) if n == &NodeId::from("end")));
    }

    #[tokio::test]
    async fn choice_echoes_learner_message() {
        let (mut session, _store, seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;
        session.choose(1).await.unwrap();

        let events = seen.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::Message { sender: Sender::User, text } if text == "no"
        )));
    }

    #[tokio::test]
    async fn terminal_node_completes_exactly_once() {
        // Example D: walk to the terminal node
        let (mut session, store, seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;
        session.choose(0).await.unwrap();
        session.advance().await.unwrap();

        assert!(session.is_finished());

        let progress = store.get().await;
        assert!(progress.is_completed(&ScenarioId::from("intro-ia")));
        assert_eq!(progress.completed_scenarios.len(), 1);
        assert!(progress.has_badge(&BadgeId::from("badge-explorer")));

        let events = seen.lock().unwrap();
        let completions = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ScenarioCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::QuizRequested { .. })));
    }

    #[tokio::test]
    async fn invalid_choice_index_is_rejected() {
        let (mut session, _store, _seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;

        let err = session.choose(7).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidChoice { index: 7, available: 2 }
        ));
        // Still awaiting the original choice
        assert!(matches!(session.affordance(), Affordance::Choices(_)));
    }

    #[tokio::test]
    async fn advance_outside_continue_is_rejected() {
        let (mut session, _store, _seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;
        assert!(matches!(
            session.advance().await.unwrap_err(),
            SessionError::NotAwaitingContinue
        ));
    }

    #[tokio::test]
    async fn resumes_from_saved_position() {
        let (mut first, store, _seen) = session_with_events(fixture_scenario()).await;
        first.start_or_resume().await;
        first.choose(0).await.unwrap();
        drop(first);

        // New session over the same store resumes at n2, not n1
        let events = EventBus::new();
        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            Arc::new(InMemoryProfileRepo::new()),
            Arc::new(StaticAuth::anonymous()),
            mock_clock(),
        ));
        let mut second = ScenarioSession::new(
            fixture_scenario(),
            Arc::clone(&store),
            events,
            sync,
            mock_clock(),
        );
        second.start_or_resume().await;
        assert!(matches!(second.affordance(), Affordance::Continue(n) if n == &NodeId::from("end")));
    }

    #[tokio::test]
    async fn stale_saved_position_falls_back_to_initial() {
        let (mut session, store, _seen) = session_with_events(fixture_scenario()).await;
        store
            .update(|mut p| {
                p.record_position(ScenarioId::from("intro-ia"), NodeId::from("removed-node"));
                p
            })
            .await;

        session.start_or_resume().await;
        // Back at n1's choices
        assert!(matches!(session.affordance(), Affordance::Choices(_)));
    }

    #[tokio::test]
    async fn dangling_edge_halts_silently_without_completion() {
        let mut scenario = (*fixture_scenario()).clone();
        if let Some(n2) = scenario.nodes.get_mut(&NodeId::from("n2")) {
            n2.next_node_id = Some(NodeId::from("missing"));
        }
        let (mut session, store, seen) = session_with_events(Arc::new(scenario)).await;
        session.start_or_resume().await;
        session.choose(0).await.unwrap();
        session.advance().await.unwrap();

        assert!(session.is_finished());
        // A defensive halt is not a completion: no persisted state and no
        // completion event for downstream counters to react to.
        assert!(!store.get().await.is_completed(&ScenarioId::from("intro-ia")));
        assert!(!seen
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, SessionEvent::ScenarioCompleted { .. })));
    }

    #[tokio::test]
    async fn authored_back_edges_revisit_normally() {
        let mut scenario = (*fixture_scenario()).clone();
        if let Some(n3) = scenario.nodes.get_mut(&NodeId::from("n3")) {
            n3.next_node_id = Some(NodeId::from("n1"));
        }
        let (mut session, _store, seen) = session_with_events(Arc::new(scenario)).await;
        session.start_or_resume().await;
        session.choose(1).await.unwrap(); // n3
        session.advance().await.unwrap(); // back to n1

        assert!(matches!(session.affordance(), Affordance::Choices(_)));
        let events = seen.lock().unwrap();
        let n1_renders = events
            .iter()
            .filter(|e| matches!(
                e,
                SessionEvent::Message { sender: Sender::Narrator, text } if text == "Shall we?"
            ))
            .count();
        assert_eq!(n1_renders, 2);
    }

    #[tokio::test]
    async fn completing_twice_keeps_one_entry_but_refires_effects() {
        let (mut session, store, seen) = session_with_events(fixture_scenario()).await;
        session.start_or_resume().await;
        session.choose(1).await.unwrap(); // n3 is terminal

        // Walk it again from scratch
        let events = EventBus::new();
        {
            let seen = Arc::clone(&seen);
            events
                .subscribe(move |event| seen.lock().unwrap().push(event))
                .await;
        }
        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            Arc::new(InMemoryProfileRepo::new()),
            Arc::new(StaticAuth::anonymous()),
            mock_clock(),
        ));
        let mut again = ScenarioSession::new(
            fixture_scenario(),
            Arc::clone(&store),
            events,
            sync,
            mock_clock(),
        );
        // Clear the saved terminal position so the walk restarts
        store
            .update(|mut p| {
                p.scenario_progress.clear();
                p
            })
            .await;
        again.start_or_resume().await;
        again.choose(1).await.unwrap();

        let progress = store.get().await;
        assert_eq!(progress.completed_scenarios.len(), 1);

        let completions = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SessionEvent::ScenarioCompleted { .. }))
            .count();
        assert_eq!(completions, 2);
    }
}
