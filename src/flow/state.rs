//! Flow state machine data: per-conversation state and the collected answers.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::FieldCatalog;

/// Where a conversation's form flow currently stands.
///
/// Progresses forward only: a new flow awaits the catalog's first
/// field, each valid answer moves to the next, and the flow terminates
/// in `Completed`. `Reset` flows are removed from the store; the
/// variant exists so stray records are still handled totally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowState {
    NotStarted,
    AwaitingField { field_id: String },
    Completed,
    Reset,
}

impl FlowState {
    /// Whether this state is terminal (the flow no longer consumes input).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Reset)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::AwaitingField { .. } => "awaiting_field",
            Self::Completed => "completed",
            Self::Reset => "reset",
        };
        write!(f, "{s}")
    }
}

/// One accepted answer, as logged for agent review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub field_id: String,
    pub value: String,
    pub recorded_at: DateTime<Utc>,
}

/// One conversation's form-filling progress.
///
/// Owned by the [`FlowStore`](crate::flow::store::FlowStore); mutated
/// only through the transition function in [`crate::flow::machine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationFlow {
    /// External chat identifier (BlueBubbles chat GUID or the CLI id).
    pub conversation_id: String,
    pub state: FlowState,
    /// Index of the field currently being collected.
    pub cursor: usize,
    /// Collected answers, in collection order.
    pub answers: IndexMap<String, String>,
    /// Accepted answers with timestamps; rejected input never lands here.
    pub history: Vec<AnswerEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationFlow {
    /// Fresh flow awaiting the catalog's first field.
    pub fn begin(conversation_id: impl Into<String>, catalog: &FieldCatalog) -> Self {
        let state = match catalog.fields().first() {
            Some(first) => FlowState::AwaitingField {
                field_id: first.id.clone(),
            },
            None => FlowState::NotStarted,
        };
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            state,
            cursor: 0,
            answers: IndexMap::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a validated answer and move the cursor past the field.
    pub fn record_answer(&mut self, field_id: &str, value: String) {
        let now = Utc::now();
        self.answers.insert(field_id.to_string(), value.clone());
        self.history.push(AnswerEvent {
            field_id: field_id.to_string(),
            value,
            recorded_at: now,
        });
        self.cursor += 1;
        self.updated_at = now;
    }

    /// Point the flow at the next field to collect.
    pub fn await_field(&mut self, field_id: &str) {
        self.state = FlowState::AwaitingField {
            field_id: field_id.to_string(),
        };
        self.updated_at = Utc::now();
    }

    /// Mark the flow finished and ready for hand-off.
    pub fn complete(&mut self) {
        self.state = FlowState::Completed;
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
