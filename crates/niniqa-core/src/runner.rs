//! Conversation orchestration: the turn loop, scenario fan-out, batch runs.
//!
//! One logical thread of control per conversation; conversations within a
//! scenario run in parallel tasks bounded by a semaphore. No mutable state
//! crosses conversation boundaries: each conversation owns its persona and
//! its turn list.

use crate::adapter::{AgentAdapter, AgentClient};
use crate::config::RunOptions;
use crate::lint::{self, LintContext};
use crate::persona::SimulatedUser;
use crate::prompts;
use crate::telemetry;
use chrono::Utc;
use niniqa_shared::conversation::{Conversation, ConversationStatus, RunResult};
use niniqa_shared::policy::Policy;
use niniqa_shared::scenario::Scenario;
use niniqa_shared::scoring;
use niniqa_shared::turn::Turn;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Drive one conversation to completion. Never fails: adapter errors end
/// the conversation with a sentinel turn and `AgentFailed` status.
pub async fn run_conversation<C: AgentClient>(
    adapter: &AgentAdapter<C>,
    scenario: &Scenario,
    policy: &Policy,
    options: &RunOptions,
    seed: u64,
    cancel: &CancellationToken,
) -> Conversation {
    let options = options.normalized();
    let started_at = Utc::now();
    let mut persona = SimulatedUser::new(scenario, seed, options.max_turns);
    let mut turns: Vec<Turn> = vec![persona.open()];
    let mut status = ConversationStatus::TurnCapped;
    let mut agent_turns = 0usize;

    loop {
        if agent_turns >= options.max_turns {
            status = ConversationStatus::TurnCapped;
            break;
        }

        let crisis_now = telemetry::crisis_timeline(&turns)
            .last()
            .copied()
            .unwrap_or(false);
        let system_prompt = prompts::build_system_prompt(scenario, policy, crisis_now);

        match adapter
            .respond(&system_prompt, &turns, crisis_now, cancel)
            .await
        {
            Ok((reply, meta)) => {
                turns.push(Turn::agent(reply.text, meta));
                agent_turns += 1;
            }
            Err(err) => {
                warn!(
                    "Conversation for scenario {} ended by adapter: {}",
                    scenario.id, err
                );
                turns.push(Turn::agent_error(err.to_string()));
                status = ConversationStatus::AgentFailed;
                break;
            }
        }

        let last_index = turns.len() - 1;
        match persona.next(&turns[last_index]) {
            Some(turn) => turns.push(turn),
            None => {
                status = ConversationStatus::Completed;
                break;
            }
        }
    }

    let crisis_at_any_point = turns
        .iter()
        .any(|t| t.meta.as_ref().is_some_and(|m| m.crisis_active));

    let context = LintContext::new(policy.clone(), scenario.language);
    let lint_results = lint::run_all(&turns, &context);
    let scores = scoring::compute_scores(&lint_results);

    info!(
        "Conversation finished: scenario={} status={:?} turns={} total={} safety={}",
        scenario.id,
        status,
        turns.len(),
        scores.total,
        scores.safety
    );

    Conversation {
        id: Uuid::new_v4(),
        scenario_id: scenario.id.clone(),
        policy: policy.clone(),
        turns,
        lint_results,
        scores,
        status,
        crisis_at_any_point,
        started_at,
        finished_at: Utc::now(),
    }
}

/// The per-conversation seed: the conversation index, so a batch is
/// reproducible run to run.
fn conversation_seed(index: usize) -> u64 {
    index as u64
}

/// Run one scenario `conversations_per_scenario` times, in parallel tasks
/// bounded by `max_concurrency`. Cancellation stops spawning and lets
/// in-flight conversations surface partial results.
pub async fn run_scenario<C: AgentClient + 'static>(
    adapter: Arc<AgentAdapter<C>>,
    scenario: &Scenario,
    policy: &Policy,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> RunResult {
    let options = options.normalized();
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency));
    let mut join_set: JoinSet<(usize, Conversation)> = JoinSet::new();

    info!(
        "Running scenario {}: {} conversations, concurrency {}",
        scenario.id, options.conversations_per_scenario, options.max_concurrency
    );

    for index in 0..options.conversations_per_scenario {
        if cancel.is_cancelled() {
            warn!(
                "Run cancelled - not spawning conversation {} of scenario {}",
                index, scenario.id
            );
            break;
        }
        let semaphore = semaphore.clone();
        let adapter = adapter.clone();
        let scenario = scenario.clone();
        let policy = policy.clone();
        let cancel = cancel.clone();
        join_set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("conversation semaphore closed");
            let conversation = run_conversation(
                &adapter,
                &scenario,
                &policy,
                &options,
                conversation_seed(index),
                &cancel,
            )
            .await;
            (index, conversation)
        });
    }

    let mut indexed: Vec<(usize, Conversation)> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(pair) => indexed.push(pair),
            Err(e) => warn!("Conversation task failed: {}", e),
        }
    }
    indexed.sort_by_key(|(index, _)| *index);

    let result = RunResult::new(
        scenario.id.clone(),
        indexed.into_iter().map(|(_, c)| c).collect(),
    );
    info!(
        "Scenario {} done: {}/{} approved ({:.0}%)",
        scenario.id,
        result.approved_count(),
        result.conversations.len(),
        result.approval_rate * 100.0
    );
    result
}

/// Run a batch of scenarios sequentially; the semaphore inside each
/// scenario bounds the only shared resource, the agent API budget.
/// Invalid scenarios are skipped, never fatal.
pub async fn run_batch<C: AgentClient + 'static>(
    adapter: Arc<AgentAdapter<C>>,
    scenarios: &[Scenario],
    policy: &Policy,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Vec<RunResult> {
    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        if cancel.is_cancelled() {
            warn!("Run cancelled - {} scenarios skipped", scenarios.len() - results.len());
            break;
        }
        if let Err(e) = scenario.validate() {
            warn!("Skipping invalid scenario {}: {}", scenario.id, e);
            continue;
        }
        results.push(run_scenario(adapter.clone(), scenario, policy, options, cancel).await);
    }
    results
}
