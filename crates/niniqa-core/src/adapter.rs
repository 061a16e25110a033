//! Agent adapter: obtain the agent's reply to the conversation so far,
//! or synthesize one locally, under timeout / bounded-retry semantics.
//!
//! Supports a live HTTP client (OpenAI-compatible chat endpoint), a
//! deterministic simulation client, and a scripted client for tests.

use crate::config::{AdapterConfig, AdapterMode};
use crate::persona::phrases;
use crate::rng::SeededRng;
use crate::telemetry;
use async_trait::async_trait;
use niniqa_shared::scenario::Language;
use niniqa_shared::turn::{Speaker, Turn, TurnMeta};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Adapter errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("request timeout after {0} seconds")]
    Timeout(u64),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("agent returned an empty completion")]
    EmptyCompletion,

    #[error("malformed agent response: {0}")]
    MalformedResponse(String),

    #[error("run cancelled")]
    Cancelled,
}

impl AgentError {
    /// Transient failures are retry-eligible; everything else is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Http { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Reply text plus the usage counts the endpoint reported.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub text: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl AgentReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// The seam between the engine and whatever produces agent text.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// One reply attempt, no retry semantics of its own.
    async fn respond(&self, system_prompt: &str, history: &[Turn])
        -> Result<AgentReply, AgentError>;

    /// Out-of-band health probe; returns measured latency in milliseconds.
    async fn healthcheck(&self) -> Result<u64, AgentError>;
}

// === Live HTTP client ===

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct HttpAgentClient {
    config: AdapterConfig,
    client: reqwest::Client,
}

impl HttpAgentClient {
    pub fn new(config: AdapterConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn messages(system_prompt: &str, history: &[Turn]) -> Vec<serde_json::Value> {
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt,
        })];
        for turn in history {
            if turn.is_error() {
                continue;
            }
            let role = match turn.speaker {
                Speaker::User => "user",
                Speaker::Agent => "assistant",
            };
            messages.push(serde_json::json!({"role": role, "content": turn.text}));
        }
        messages
    }

    fn map_send_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(self.config.timeout_secs)
        } else {
            AgentError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn respond(
        &self,
        system_prompt: &str,
        history: &[Turn],
    ) -> Result<AgentReply, AgentError> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": Self::messages(system_prompt, history),
            "temperature": self.config.temperature,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            let mut message: String = message.chars().take(200).collect();
            if message.is_empty() {
                message = status.to_string();
            }
            return Err(AgentError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;

        let text = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                AgentError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;
        if text.trim().is_empty() {
            return Err(AgentError::EmptyCompletion);
        }

        let usage = json.get("usage");
        let prompt_tokens = usage
            .and_then(|u| u.get("prompt_tokens"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);
        let completion_tokens = usage
            .and_then(|u| u.get("completion_tokens"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        Ok(AgentReply {
            text: text.to_string(),
            prompt_tokens,
            completion_tokens,
        })
    }

    async fn healthcheck(&self) -> Result<u64, AgentError> {
        let url = format!("{}/v1/models", self.config.endpoint);
        let start = Instant::now();
        let mut request = self.client.get(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                message: status.to_string(),
            });
        }
        Ok(start.elapsed().as_millis() as u64)
    }
}

// === Simulation client ===

/// Deterministic local stand-in for the live agent. Replies are canned
/// templates bucketed by turn count, with emoji appended per `emoji_bias`.
pub struct SimulatedAgentClient {
    language: Language,
    emoji_bias: f32,
    rng: Mutex<SeededRng>,
}

const SIM_EMOJI: &[&str] = &["🙂", "💙", "✨"];

impl SimulatedAgentClient {
    pub fn new(language: Language, emoji_bias: f32, seed: u64) -> Self {
        Self {
            language,
            emoji_bias: emoji_bias.clamp(0.0, 1.0),
            rng: Mutex::new(SeededRng::new(seed)),
        }
    }
}

#[async_trait]
impl AgentClient for SimulatedAgentClient {
    async fn respond(
        &self,
        _system_prompt: &str,
        history: &[Turn],
    ) -> Result<AgentReply, AgentError> {
        let agent_turns = history.iter().filter(|t| t.is_agent()).count();
        let crisis_signaled = history
            .iter()
            .filter(|t| t.is_user())
            .any(|t| telemetry::user_crisis_signal(&t.text));

        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AgentError::MalformedResponse("simulation state poisoned".to_string()))?;
        let mut text =
            phrases::canned_agent_reply(self.language, agent_turns, crisis_signaled, &mut rng);
        if !crisis_signaled && rng.chance(self.emoji_bias) {
            if let Some(emoji) = rng.pick(SIM_EMOJI) {
                text.push(' ');
                text.push_str(emoji);
            }
        }
        Ok(AgentReply::from_text(text))
    }

    async fn healthcheck(&self) -> Result<u64, AgentError> {
        Ok(0)
    }
}

// === Scripted client (tests) ===

/// Test double driven by a queued response script. A single remaining
/// entry repeats forever; an exhausted multi-entry script returns
/// `EmptyCompletion`.
pub struct ScriptedAgentClient {
    responses: Mutex<Vec<Result<AgentReply, AgentError>>>,
    calls: Mutex<usize>,
}

impl ScriptedAgentClient {
    pub fn new(responses: Vec<Result<AgentReply, AgentError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(0),
        }
    }

    /// Script of plain replies.
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| Ok(AgentReply::from_text(*t)))
                .collect(),
        )
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("call counter poisoned")
    }
}

#[async_trait]
impl AgentClient for ScriptedAgentClient {
    async fn respond(
        &self,
        _system_prompt: &str,
        _history: &[Turn],
    ) -> Result<AgentReply, AgentError> {
        *self.calls.lock().expect("call counter poisoned") += 1;
        let mut responses = self.responses.lock().expect("script poisoned");
        if responses.is_empty() {
            return Err(AgentError::EmptyCompletion);
        }
        if responses.len() == 1 {
            responses[0].clone()
        } else {
            responses.remove(0)
        }
    }

    async fn healthcheck(&self) -> Result<u64, AgentError> {
        Ok(0)
    }
}

// === Retry wrapper ===

/// Wraps a client with the policy the runner relies on: hard timeout,
/// bounded sequential retries with fixed delays, cancellation, and
/// telemetry extraction.
pub struct AgentAdapter<C: AgentClient> {
    client: C,
    timeout_secs: u64,
    max_retries: u32,
    retry_delay_ms: Vec<u64>,
}

impl<C: AgentClient> AgentAdapter<C> {
    pub fn new(client: C, config: &AdapterConfig) -> Self {
        Self {
            client,
            timeout_secs: config.timeout_secs.max(1),
            max_retries: config.max_retries,
            retry_delay_ms: config.retry_delay_ms.clone(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// One logical reply with retry semantics. On success the reply comes
    /// back with derived telemetry for the turn.
    pub async fn respond(
        &self,
        system_prompt: &str,
        history: &[Turn],
        crisis_active: bool,
        cancel: &CancellationToken,
    ) -> Result<(AgentReply, TurnMeta), AgentError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                result = timeout(
                    Duration::from_secs(self.timeout_secs),
                    self.client.respond(system_prompt, history),
                ) => match result {
                    Ok(inner) => inner,
                    Err(_) => Err(AgentError::Timeout(self.timeout_secs)),
                },
            };

            match outcome {
                Ok(reply) => {
                    let meta = telemetry::turn_meta(&reply.text, crisis_active);
                    debug!(
                        "Agent replied on attempt {} ({} chars, {} emoji)",
                        attempt, meta.chars, meta.emoji_count
                    );
                    return Ok((reply, meta));
                }
                Err(err) => {
                    if !err.is_transient() || attempt > self.max_retries {
                        warn!("Agent call failed terminally on attempt {}: {}", attempt, err);
                        return Err(err);
                    }
                    let delay = self
                        .retry_delay_ms
                        .get((attempt - 1) as usize)
                        .copied()
                        .unwrap_or(1000);
                    warn!(
                        "Transient agent failure on attempt {}: {} - retrying in {}ms",
                        attempt, err, delay
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                        _ = sleep(Duration::from_millis(delay)) => {}
                    }
                }
            }
        }
    }
}

/// Out-of-band connectivity probe, independent of any conversation.
pub async fn test_connectivity(config: &AdapterConfig) -> Result<u64, AgentError> {
    match config.mode {
        AdapterMode::Simulated => Ok(0),
        AdapterMode::Live => {
            let client = HttpAgentClient::new(config.clone())?;
            client.healthcheck().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> AdapterConfig {
        AdapterConfig {
            retry_delay_ms: vec![0, 0],
            ..Default::default()
        }
    }

    fn transient() -> AgentError {
        AgentError::Http {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(AgentError::Timeout(20).is_transient());
        assert!(AgentError::Network("reset".to_string()).is_transient());
        for status in [429u16, 500, 502, 503, 504] {
            assert!(AgentError::Http {
                status,
                message: String::new()
            }
            .is_transient());
        }
        assert!(!AgentError::Http {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!AgentError::EmptyCompletion.is_transient());
        assert!(!AgentError::MalformedResponse("x".to_string()).is_transient());
        assert!(!AgentError::Cancelled.is_transient());
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let client = ScriptedAgentClient::new(vec![
            Err(transient()),
            Err(AgentError::Timeout(1)),
            Ok(AgentReply::from_text("hola 🙂")),
        ]);
        let adapter = AgentAdapter::new(client, &fast_config());
        let cancel = CancellationToken::new();
        let (reply, meta) = adapter
            .respond("sys", &[], false, &cancel)
            .await
            .expect("third attempt succeeds");
        assert_eq!(reply.text, "hola 🙂");
        assert_eq!(meta.emoji_count, 1);
        assert_eq!(adapter.client().call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_surfaces_last_error() {
        let client = ScriptedAgentClient::new(vec![Err(transient())]);
        let adapter = AgentAdapter::new(client, &fast_config());
        let cancel = CancellationToken::new();
        let err = adapter
            .respond("sys", &[], false, &cancel)
            .await
            .expect_err("all attempts fail");
        assert!(err.is_transient());
        // Initial attempt + 2 retries.
        assert_eq!(adapter.client().call_count(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let client = ScriptedAgentClient::new(vec![Err(AgentError::Http {
            status: 400,
            message: "bad request".to_string(),
        })]);
        let adapter = AgentAdapter::new(client, &fast_config());
        let cancel = CancellationToken::new();
        let err = adapter.respond("sys", &[], false, &cancel).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(adapter.client().call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_pre_empts_call() {
        let client = ScriptedAgentClient::from_texts(&["hola"]);
        let adapter = AgentAdapter::new(client, &fast_config());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = adapter.respond("sys", &[], false, &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(adapter.client().call_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_single_entry_repeats() {
        let client = ScriptedAgentClient::from_texts(&["same"]);
        for _ in 0..3 {
            let reply = client.respond("", &[]).await.unwrap();
            assert_eq!(reply.text, "same");
        }
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_simulated_client_is_deterministic() {
        let history = vec![Turn::user("me siento fatal con mi pareja")];
        let a = SimulatedAgentClient::new(Language::Es, 0.5, 42);
        let b = SimulatedAgentClient::new(Language::Es, 0.5, 42);
        for _ in 0..5 {
            let ra = a.respond("sys", &history).await.unwrap();
            let rb = b.respond("sys", &history).await.unwrap();
            assert_eq!(ra.text, rb.text);
        }
    }

    #[tokio::test]
    async fn test_simulated_client_acknowledges_crisis_without_emoji() {
        let history = vec![Turn::user("ya no aguanto más, pienso en hacerme daño")];
        let client = SimulatedAgentClient::new(Language::Es, 1.0, 7);
        let reply = client.respond("sys", &history).await.unwrap();
        assert!(telemetry::agent_crisis_acknowledgment(&reply.text));
        assert_eq!(telemetry::emoji_count(&reply.text), 0);
    }

    #[tokio::test]
    async fn test_connectivity_simulated_mode() {
        let latency = test_connectivity(&AdapterConfig::default()).await.unwrap();
        assert_eq!(latency, 0);
    }

    #[test]
    fn test_http_messages_skip_error_turns() {
        let history = vec![
            Turn::user("hola"),
            Turn::agent("hola, cuéntame", TurnMeta::default()),
            Turn::agent_error("boom"),
        ];
        let messages = HttpAgentClient::messages("sys", &history);
        assert_eq!(messages.len(), 3); // system + user + assistant
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[2]["role"], "assistant");
    }
}
