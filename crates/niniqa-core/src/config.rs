//! Engine configuration: adapter settings, run options, policy loading.

use anyhow::{Context, Result};
use niniqa_shared::policy::Policy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Where agent replies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterMode {
    /// Deterministic local replies; no network.
    #[default]
    Simulated,
    /// HTTP calls against the real agent endpoint.
    Live,
}

/// Settings for the agent adapter. Credentials are carried here for the
/// duration of a run and nowhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub mode: AdapterMode,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Never serialized back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed inter-attempt delays, indexed by retry number.
    #[serde(default = "default_retry_delays")]
    pub retry_delay_ms: Vec<u64>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8700".to_string()
}

fn default_model() -> String {
    "nini-chat".to_string()
}

fn default_timeout() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delays() -> Vec<u64> {
    vec![500, 1500]
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mode: AdapterMode::Simulated,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delays(),
            temperature: default_temperature(),
        }
    }
}

/// Batch-level run options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default = "default_conversations")]
    pub conversations_per_scenario: usize,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Upper bound on concurrently running conversations.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
}

fn default_conversations() -> usize {
    3
}

fn default_max_turns() -> usize {
    12
}

fn default_concurrency() -> usize {
    4
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            conversations_per_scenario: default_conversations(),
            max_turns: default_max_turns(),
            max_concurrency: default_concurrency(),
        }
    }
}

impl RunOptions {
    /// Both counts are documented as >= 1; clamp instead of failing.
    pub fn normalized(&self) -> Self {
        Self {
            conversations_per_scenario: self.conversations_per_scenario.max(1),
            max_turns: self.max_turns.max(1),
            max_concurrency: self.max_concurrency.max(1),
        }
    }
}

/// Load a PolicySpec document from disk.
///
/// An unreadable file is a caller error; unparseable content degrades to
/// defaults with a warning, matching the lenient `Policy::from_spec`
/// contract.
pub fn load_policy_file<P: AsRef<Path>>(path: P) -> Result<Policy> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read policy spec {}", path.display()))?;
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => Ok(Policy::from_spec(&value)),
        Err(e) => {
            warn!("Unparseable policy spec {}: {} - using defaults", path.display(), e);
            Ok(Policy::default())
        }
    }
}
