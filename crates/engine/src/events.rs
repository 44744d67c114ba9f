//! Event bus between the dialogue walker and the presentation layer.
//!
//! Push-based subscription model: the presentation layer registers callbacks
//! and the walker dispatches events as it steps through a scenario. This is
//! the explicit channel replacing implicit global event dispatch - the walker
//! writes here, the UI reads here, and nothing else couples them.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use chatling_domain::{Choice, ScenarioId, Sender};

/// Events the core emits to the presentation layer.
///
/// All of these are fire-and-forget: the walker never waits for an
/// acknowledgment, and a missing subscriber is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Render one chat message.
    Message { sender: Sender, text: String },
    /// The current node offers these selectable choices.
    ChoicesOffered { choices: Vec<Choice> },
    /// A node-attached action fired (animation, image, quiz trigger...).
    ActionTriggered {
        scenario_id: ScenarioId,
        tag: String,
        data: Option<Value>,
    },
    /// Terminal node reached; the scenario is recorded as completed.
    ScenarioCompleted { scenario_id: ScenarioId },
    /// The completion sequence asks the UI to start the scenario's quiz.
    QuizRequested { scenario_id: ScenarioId },
}

/// Event bus with interior mutability so walker and UI can share clones.
///
/// Holds strong references to subscribers; they persist until the bus is
/// dropped.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Box<dyn FnMut(SessionEvent) + Send + 'static>>>>,
}

impl EventBus {
    /// Create a new EventBus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all events. The callback is invoked for every event the
    /// walker dispatches.
    pub async fn subscribe(&self, callback: impl FnMut(SessionEvent) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Dispatch an event to all subscribers, each receiving a clone.
    pub async fn dispatch(&self, event: SessionEvent) {
        let mut subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter_mut() {
            subscriber(event.clone());
        }
    }

    /// Get the number of subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}
