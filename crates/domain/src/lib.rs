//! Chatling domain layer.
//!
//! Pure types and invariants for the branching-dialogue learning engine:
//! the authored scenario content model, the per-user progress record, and the
//! local/remote merge policy. No I/O and no async - everything here is usable
//! from any runtime.

pub mod error;
pub mod ids;
pub mod progress;
pub mod scenario;

pub use error::DomainError;
pub use ids::{BadgeId, NodeId, ScenarioId, UserId};
pub use progress::{MergeOutcome, UserProgress, MAX_SCORE};
pub use scenario::{
    Badge, Choice, ChoiceStyle, DeepMode, DialogueNode, Difficulty, Language, NodeAction,
    NodeFlow, Quiz, QuizQuestion, Scenario, Sender,
};
