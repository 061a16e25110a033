//! Emoji policy rules: count cap, forbidden phases, and the safe set.

use super::LintContext;
use crate::telemetry;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::turn::Turn;

pub fn check(turns: &[Turn], context: &LintContext) -> Vec<TurnLintResult> {
    let policy = &context.policy.emoji;
    let mut results = Vec::new();
    for (index, turn) in turns.iter().enumerate() {
        if !turn.is_agent() || turn.is_error() {
            continue;
        }
        let emoji = telemetry::extract_emoji(&turn.text);
        if emoji.is_empty() {
            continue;
        }
        let mut findings = Vec::new();

        if emoji.len() > policy.max_per_message {
            findings.push(LintFinding::fail(LintCode::EmojiMax).with_details(format!(
                "count={}, max={}",
                emoji.len(),
                policy.max_per_message
            )));
        }

        let phase = turn
            .meta
            .as_ref()
            .and_then(|m| m.phase)
            .or_else(|| telemetry::classify_phase(&turn.text));
        if let Some(phase) = phase {
            if policy.forbids_phase(phase.as_str()) {
                findings.push(
                    LintFinding::fail(LintCode::EmojiForbiddenPhase)
                        .with_details(format!("phase={phase}")),
                );
            }
        }

        // One finding per offending emoji.
        for e in &emoji {
            if !policy.is_safe(&e.to_string()) {
                findings.push(
                    LintFinding::fail(LintCode::EmojiUnsafe).with_details(e.to_string()),
                );
            }
        }

        if !findings.is_empty() {
            results.push(TurnLintResult::new(index, findings));
        }
    }
    results
}
