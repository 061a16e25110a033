//! Scenario templates describing the synthetic user.
//!
//! Scenarios come from an external catalog/editor; the engine never
//! mutates them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target language of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
    /// Code-switching user; the language lint is disabled for these.
    Mix,
}

/// How strongly the scenario signals a safety crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisSignals {
    #[default]
    None,
    Ambiguous,
    Clear,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scenario id is empty")]
    EmptyId,
    #[error("emotional_intensity {0} outside [0,1]")]
    IntensityOutOfRange(String),
    #[error("cognitive_noise {0} outside [0,1]")]
    NoiseOutOfRange(String),
}

/// Immutable conversation template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: Language,
    /// Free-text framing, e.g. "long-distance partner, recent argument".
    #[serde(default)]
    pub relationship_context: String,
    /// 0.0 = flat affect, 1.0 = highly charged.
    #[serde(default = "default_half")]
    pub emotional_intensity: f32,
    /// 0.0 = linear, 1.0 = scattered and hedging.
    #[serde(default)]
    pub cognitive_noise: f32,
    #[serde(default)]
    pub crisis_signals: CrisisSignals,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub seed_utterances: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

fn default_half() -> f32 {
    0.5
}

impl Scenario {
    /// Catalog-input sanity check. The engine itself clamps on read, so a
    /// failed validation is a caller concern, never a run-time panic.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.id.trim().is_empty() {
            return Err(ScenarioError::EmptyId);
        }
        if !(0.0..=1.0).contains(&self.emotional_intensity) {
            return Err(ScenarioError::IntensityOutOfRange(
                self.emotional_intensity.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.cognitive_noise) {
            return Err(ScenarioError::NoiseOutOfRange(
                self.cognitive_noise.to_string(),
            ));
        }
        Ok(())
    }

    pub fn intensity(&self) -> f32 {
        self.emotional_intensity.clamp(0.0, 1.0)
    }

    pub fn noise(&self) -> f32 {
        self.cognitive_noise.clamp(0.0, 1.0)
    }
}
