//! Conversation aggregates and run results.
//!
//! These are the shapes the external reporting layer consumes; they must
//! stay fully self-describing and JSON-serializable.

use crate::findings::TurnLintResult;
use crate::policy::Policy;
use crate::scoring::{self, ConversationScores};
use crate::turn::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a conversation's turn loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// The simulated user ended the conversation on its own terms.
    Completed,
    /// The adapter failed terminally; a sentinel error turn was appended.
    AgentFailed,
    /// The `max_turns` cap stopped the loop.
    TurnCapped,
}

/// Aggregate root for one simulated conversation. Owns its turns and lint
/// results; immutable once the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub scenario_id: String,
    /// Policy snapshot the run observed; kept so scores stay reproducible.
    pub policy: Policy,
    pub turns: Vec<Turn>,
    pub lint_results: Vec<TurnLintResult>,
    pub scores: ConversationScores,
    pub status: ConversationStatus,
    /// Informational only: crisis mode was active at some point. Never a gate.
    pub crisis_at_any_point: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_approved(&self) -> bool {
        scoring::is_approved(&self.scores)
    }

    pub fn agent_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_agent()).count()
    }
}

/// Every conversation produced for one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub scenario_id: String,
    pub conversations: Vec<Conversation>,
    /// Fraction of conversations passing the approval gate.
    pub approval_rate: f64,
}

impl RunResult {
    pub fn new(scenario_id: impl Into<String>, conversations: Vec<Conversation>) -> Self {
        let approval_rate = scoring::approval_rate(conversations.iter().map(|c| &c.scores));
        Self {
            scenario_id: scenario_id.into(),
            conversations,
            approval_rate,
        }
    }

    pub fn approved_count(&self) -> usize {
        self.conversations
            .iter()
            .filter(|c| c.is_approved())
            .count()
    }
}
