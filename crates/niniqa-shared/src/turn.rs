//! Conversation turns and per-turn telemetry.

use serde::{Deserialize, Serialize};

/// Reserved error code carried by the synthetic turn the runner appends
/// when the adapter fails terminally.
pub const AGENT_UNAVAILABLE: &str = "AGENT_UNAVAILABLE";

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Agent,
}

/// Coarse rhetorical phase of an agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Recap,
    Questioning,
    Insight,
    Move,
    Reflection,
}

impl AgentPhase {
    /// Stable name, matching `emoji_policy.forbid_in_phases` entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recap => "recap",
            Self::Questioning => "questioning",
            Self::Insight => "insight",
            Self::Move => "move",
            Self::Reflection => "reflection",
        }
    }

    /// Position in the nominal recap→reflection progression.
    /// Used only by the advisory high-water mark.
    pub fn index(&self) -> usize {
        match self {
            Self::Recap => 0,
            Self::Questioning => 1,
            Self::Insight => 2,
            Self::Move => 3,
            Self::Reflection => 4,
        }
    }
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived telemetry attached to agent turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnMeta {
    pub chars: usize,
    pub emoji_count: usize,
    pub crisis_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<AgentPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One utterance. Turns are append-only and owned by their conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TurnMeta>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            meta: None,
        }
    }

    pub fn agent(text: impl Into<String>, meta: TurnMeta) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            meta: Some(meta),
        }
    }

    /// Synthetic terminal turn appended when the adapter gives up.
    /// The reserved code lives in `meta.error`; the failure message in `text`.
    pub fn agent_error(message: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: message.into(),
            meta: Some(TurnMeta {
                error: Some(AGENT_UNAVAILABLE.to_string()),
                ..Default::default()
            }),
        }
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }

    pub fn is_agent(&self) -> bool {
        self.speaker == Speaker::Agent
    }

    /// True for the synthetic error turn; lint checkers skip these.
    pub fn is_error(&self) -> bool {
        self.meta
            .as_ref()
            .is_some_and(|m| m.error.is_some())
    }
}
