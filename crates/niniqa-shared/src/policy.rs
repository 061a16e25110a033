//! Run policy: message limits, emoji rules, and behavior knobs.
//!
//! Parsed leniently from an external PolicySpec document. Malformed or
//! missing fields fall back to defaults; policy reading never aborts a run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emoji rules applied to agent turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiPolicy {
    #[serde(default = "default_emoji_max")]
    pub max_per_message: usize,
    /// Emoji the agent is allowed to use at all.
    #[serde(default = "default_safe_set")]
    pub safe_set: Vec<String>,
    /// Phase names (see `AgentPhase::as_str`) where any emoji is a finding.
    #[serde(default = "default_forbid_phases")]
    pub forbid_in_phases: Vec<String>,
}

fn default_emoji_max() -> usize {
    2
}

fn default_safe_set() -> Vec<String> {
    ["🙂", "💙", "🌱", "✨", "🤝"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_forbid_phases() -> Vec<String> {
    vec!["questioning".to_string()]
}

impl Default for EmojiPolicy {
    fn default() -> Self {
        Self {
            max_per_message: default_emoji_max(),
            safe_set: default_safe_set(),
            forbid_in_phases: default_forbid_phases(),
        }
    }
}

impl EmojiPolicy {
    pub fn is_safe(&self, emoji: &str) -> bool {
        self.safe_set.iter().any(|s| s == emoji)
    }

    pub fn forbids_phase(&self, phase: &str) -> bool {
        self.forbid_in_phases.iter().any(|p| p == phase)
    }
}

/// Named tunables controlling agent behavior, all in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Knobs {
    #[serde(default = "default_empathy")]
    pub empathy: f32,
    #[serde(default = "default_directiveness")]
    pub directiveness: f32,
    #[serde(default = "default_probing_rate")]
    pub probing_rate: f32,
    #[serde(default = "default_emoji_bias")]
    pub emoji_bias: f32,
    #[serde(default = "default_crisis_mode")]
    pub crisis_mode_enabled: bool,
    /// Knobs the engine does not interpret itself but carries through
    /// to the system prompt.
    #[serde(default)]
    pub extra: BTreeMap<String, f32>,
}

fn default_empathy() -> f32 {
    0.7
}

fn default_directiveness() -> f32 {
    0.5
}

fn default_probing_rate() -> f32 {
    0.4
}

fn default_emoji_bias() -> f32 {
    0.3
}

fn default_crisis_mode() -> bool {
    true
}

impl Default for Knobs {
    fn default() -> Self {
        Self {
            empathy: default_empathy(),
            directiveness: default_directiveness(),
            probing_rate: default_probing_rate(),
            emoji_bias: default_emoji_bias(),
            crisis_mode_enabled: default_crisis_mode(),
            extra: BTreeMap::new(),
        }
    }
}

/// Immutable per-run policy snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_max_chars")]
    pub max_chars_per_message: usize,
    #[serde(default)]
    pub emoji: EmojiPolicy,
    #[serde(default)]
    pub knobs: Knobs,
}

fn default_max_chars() -> usize {
    900
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_chars_per_message: default_max_chars(),
            emoji: EmojiPolicy::default(),
            knobs: Knobs::default(),
        }
    }
}

/// Look a field up under its document name or its snake_case alias.
fn field<'a>(
    value: &'a serde_json::Value,
    camel: &str,
    snake: &str,
) -> Option<&'a serde_json::Value> {
    value.get(camel).or_else(|| value.get(snake))
}

fn knob_f32(value: Option<&serde_json::Value>, fallback: f32) -> f32 {
    value
        .and_then(serde_json::Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(fallback)
        .clamp(0.0, 1.0)
}

fn string_list(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

impl Policy {
    /// Lenient PolicySpec reader. Every unreadable field degrades to its
    /// default; this function cannot fail.
    pub fn from_spec(spec: &serde_json::Value) -> Self {
        let mut policy = Self::default();

        if let Some(v) = field(spec, "maxCharsPerMessage", "max_chars_per_message")
            .and_then(serde_json::Value::as_u64)
        {
            if v > 0 {
                policy.max_chars_per_message = v as usize;
            }
        }

        if let Some(emoji) = field(spec, "emojiPolicy", "emoji_policy") {
            if let Some(v) = field(emoji, "maxPerMessage", "max_per_message")
                .and_then(serde_json::Value::as_u64)
            {
                policy.emoji.max_per_message = v as usize;
            }
            if let Some(set) = string_list(field(emoji, "safeSet", "safe_set")) {
                policy.emoji.safe_set = set;
            }
            if let Some(phases) =
                string_list(field(emoji, "forbidInPhases", "forbid_in_phases"))
            {
                policy.emoji.forbid_in_phases = phases;
            }
        }

        if let Some(knobs) = spec.get("knobs") {
            policy.knobs.empathy = knob_f32(knobs.get("empathy"), policy.knobs.empathy);
            policy.knobs.directiveness =
                knob_f32(knobs.get("directiveness"), policy.knobs.directiveness);
            policy.knobs.probing_rate =
                knob_f32(field(knobs, "probingRate", "probing_rate"), policy.knobs.probing_rate);
            policy.knobs.emoji_bias =
                knob_f32(field(knobs, "emojiBias", "emoji_bias"), policy.knobs.emoji_bias);
            if let Some(v) = field(knobs, "crisisModeEnabled", "crisis_mode_enabled")
                .and_then(serde_json::Value::as_bool)
            {
                policy.knobs.crisis_mode_enabled = v;
            }

            // Carry unknown numeric knobs through untouched.
            if let Some(map) = knobs.as_object() {
                for (key, value) in map {
                    let known = matches!(
                        key.as_str(),
                        "empathy"
                            | "directiveness"
                            | "probingRate"
                            | "probing_rate"
                            | "emojiBias"
                            | "emoji_bias"
                            | "crisisModeEnabled"
                            | "crisis_mode_enabled"
                    );
                    if !known {
                        if let Some(v) = value.as_f64() {
                            policy
                                .knobs
                                .extra
                                .insert(key.clone(), (v as f32).clamp(0.0, 1.0));
                        }
                    }
                }
            }
        }

        policy
    }
}
