//! Scenario content model.
//!
//! A scenario is a self-contained branching dialogue unit: a node graph with an
//! entry point, an optional prerequisite badge gating access, and a badge
//! awarded on completion. Content is authored as JSON and loaded read-only; the
//! engine never creates or mutates scenarios at runtime.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainError;
use crate::ids::{BadgeId, NodeId, ScenarioId};

/// Authored difficulty tier, used for catalog ordering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(DomainError::parse(format!("Unknown difficulty: {}", s))),
        }
    }
}

/// Content language. The catalog serves one language at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Es => write!(f, "es"),
            Self::En => write!(f, "en"),
        }
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            _ => Err(DomainError::parse(format!("Unknown language: {}", s))),
        }
    }
}

/// Who a dialogue line is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The guide character carrying the lesson.
    Narrator,
    /// Echoed back on behalf of the learner.
    User,
    /// Out-of-band notices (mission complete, hints).
    System,
}

/// Visual weight of a choice button. Presentation-layer hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceStyle {
    #[default]
    Default,
    Primary,
    Danger,
}

/// One selectable edge out of a dialogue node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub next_node_id: NodeId,
    #[serde(default)]
    pub style: ChoiceStyle,
}

/// Side effect a node asks the presentation layer to perform.
///
/// The vocabulary is fixed; payloads are typed per kind. Tags this build does
/// not know fold into `Unknown` so newer content still loads.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    Smile,
    Think,
    Dance,
    ShowImage { url: String },
    PlayAnimation { name: String },
    TriggerQuiz,
    Unknown { tag: String, data: Option<Value> },
}

impl NodeAction {
    /// Reassemble from the authored wire shape: a string tag plus an opaque
    /// payload object.
    fn from_wire(tag: String, data: Option<Value>) -> Self {
        match tag.as_str() {
            "smile" => Self::Smile,
            "think" => Self::Think,
            "dance" => Self::Dance,
            "show_image" => match data.as_ref().and_then(|d| d.get("url")).and_then(Value::as_str) {
                Some(url) => Self::ShowImage {
                    url: url.to_string(),
                },
                None => Self::Unknown { tag, data },
            },
            "play_animation" => {
                match data.as_ref().and_then(|d| d.get("name")).and_then(Value::as_str) {
                    Some(name) => Self::PlayAnimation {
                        name: name.to_string(),
                    },
                    None => Self::Unknown { tag, data },
                }
            }
            "trigger_quiz" => Self::TriggerQuiz,
            _ => Self::Unknown { tag, data },
        }
    }

    /// The wire shape: string tag plus opaque payload. Event dispatch uses
    /// this too so the presentation layer sees the authored vocabulary.
    pub fn to_wire(&self) -> (String, Option<Value>) {
        match self {
            Self::Smile => ("smile".into(), None),
            Self::Think => ("think".into(), None),
            Self::Dance => ("dance".into(), None),
            Self::ShowImage { url } => (
                "show_image".into(),
                Some(serde_json::json!({ "url": url })),
            ),
            Self::PlayAnimation { name } => (
                "play_animation".into(),
                Some(serde_json::json!({ "name": name })),
            ),
            Self::TriggerQuiz => ("trigger_quiz".into(), None),
            Self::Unknown { tag, data } => (tag.clone(), data.clone()),
        }
    }
}

/// One step of a dialogue graph.
///
/// Flow is exactly one of: choices, a single auto-advance target, or neither
/// (terminal). When authored content carries both, choices win - see
/// [`DialogueNode::flow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DialogueNodeWire", into = "DialogueNodeWire")]
pub struct DialogueNode {
    pub id: NodeId,
    pub sender: Sender,
    pub text: String,
    pub next_node_id: Option<NodeId>,
    pub options: Vec<Choice>,
    pub action: Option<NodeAction>,
}

/// Authored JSON shape of a node: action tag and payload as separate fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DialogueNodeWire {
    id: NodeId,
    sender: Sender,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action_data: Option<Value>,
}

impl From<DialogueNodeWire> for DialogueNode {
    fn from(wire: DialogueNodeWire) -> Self {
        Self {
            id: wire.id,
            sender: wire.sender,
            text: wire.text,
            next_node_id: wire.next_node_id,
            options: wire.options,
            action: wire
                .action
                .map(|tag| NodeAction::from_wire(tag, wire.action_data)),
        }
    }
}

impl From<DialogueNode> for DialogueNodeWire {
    fn from(node: DialogueNode) -> Self {
        let (action, action_data) = match node.action {
            Some(a) => {
                let (tag, data) = a.to_wire();
                (Some(tag), data)
            }
            None => (None, None),
        };
        Self {
            id: node.id,
            sender: node.sender,
            text: node.text,
            next_node_id: node.next_node_id,
            options: node.options,
            action,
            action_data,
        }
    }
}

/// Derived flow view of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeFlow<'a> {
    /// One or more selectable edges.
    Choices(&'a [Choice]),
    /// Single auto-advance target behind a "continue" affordance.
    Advance(&'a NodeId),
    /// No outgoing edge: reaching this node completes the scenario.
    Terminal,
}

impl DialogueNode {
    pub fn flow(&self) -> NodeFlow<'_> {
        if !self.options.is_empty() {
            NodeFlow::Choices(&self.options)
        } else if let Some(next) = &self.next_node_id {
            NodeFlow::Advance(next)
        } else {
            NodeFlow::Terminal
        }
    }
}

/// Badge awarded when a scenario is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// One quiz question attached to a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

/// Optional end-of-scenario quiz. The engine only signals quiz start; running
/// it is the presentation layer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// Optional "learn more" long-form content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepMode {
    pub enabled: bool,
    pub content_markdown: String,
}

/// A self-contained branching dialogue unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: Language,

    /// Badge the learner must hold before this scenario is accessible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_badge_id: Option<BadgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocks_scenario_id: Option<ScenarioId>,

    pub badge: Badge,

    pub initial_node_id: NodeId,
    pub nodes: HashMap<NodeId, DialogueNode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_mode: Option<DeepMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
}

impl Scenario {
    /// Unlock evaluation: accessible when no prerequisite badge is declared,
    /// otherwise only when the prerequisite has been earned.
    ///
    /// Pure and total - no I/O, never panics.
    pub fn is_unlocked(&self, earned_badges: &BTreeSet<BadgeId>) -> bool {
        match &self.required_badge_id {
            None => true,
            Some(required) => earned_badges.contains(required),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    /// Defensive content check: reports the problems a broken authoring pass
    /// can introduce. Persisted progress is untrusted too, so the walker still
    /// halts gracefully at walk time; this exists so the loader can warn early.
    pub fn validate(&self) -> Vec<DomainError> {
        let mut problems = Vec::new();

        if !self.nodes.contains_key(&self.initial_node_id) {
            problems.push(DomainError::validation(format!(
                "initial node '{}' not present in scenario '{}'",
                self.initial_node_id, self.id
            )));
        }

        for node in self.nodes.values() {
            if let Some(next) = &node.next_node_id {
                if !self.nodes.contains_key(next) {
                    problems.push(DomainError::validation(format!(
                        "node '{}' advances to missing node '{}'",
                        node.id, next
                    )));
                }
            }
            for choice in &node.options {
                if !self.nodes.contains_key(&choice.next_node_id) {
                    problems.push(DomainError::validation(format!(
                        "choice '{}' on node '{}' targets missing node '{}'",
                        choice.label, node.id, choice.next_node_id
                    )));
                }
            }
        }

        problems
    }
}
