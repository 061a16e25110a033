//! Phase classification and question-shape rules.
//!
//! The phase-order high-water mark is advisory: it is tracked and logged,
//! but regressions never produce a finding.

use super::LintContext;
use crate::telemetry;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::turn::{AgentPhase, Turn};
use tracing::debug;

/// Longest tolerated question, in characters.
pub const MAX_QUESTION_CHARS: usize = 140;

pub fn check(turns: &[Turn], _context: &LintContext) -> Vec<TurnLintResult> {
    let mut results = Vec::new();
    let mut high_water: Option<usize> = None;

    for (index, turn) in turns.iter().enumerate() {
        if !turn.is_agent() || turn.is_error() {
            continue;
        }
        match telemetry::classify_phase(&turn.text) {
            None => {
                let details = if turn.text.trim().is_empty() {
                    "empty text"
                } else {
                    "unclassifiable"
                };
                results.push(TurnLintResult::new(
                    index,
                    vec![LintFinding::fail(LintCode::PhaseUnknown).with_details(details)],
                ));
            }
            Some(phase) => {
                if phase == AgentPhase::Questioning {
                    let questions = turn.text.matches('?').count();
                    let longest = longest_question_chars(&turn.text);
                    if questions > 1 {
                        results.push(TurnLintResult::new(
                            index,
                            vec![LintFinding::fail(LintCode::PhaseQuestionLen)
                                .with_details(format!("questions={questions}"))],
                        ));
                    } else if longest > MAX_QUESTION_CHARS {
                        results.push(TurnLintResult::new(
                            index,
                            vec![LintFinding::fail(LintCode::PhaseQuestionLen)
                                .with_details(format!("question_len={longest}"))],
                        ));
                    }
                }

                // Advisory order tracking: never regress, never block.
                match high_water {
                    Some(mark) if phase.index() < mark => {
                        debug!(
                            "Phase {} at turn {} regresses below high-water mark {}",
                            phase, index, mark
                        );
                    }
                    _ => high_water = Some(phase.index().max(high_water.unwrap_or(0))),
                }
            }
        }
    }
    results
}

/// Character length of the longest question sentence.
fn longest_question_chars(text: &str) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    for c in text.chars() {
        current += 1;
        if c == '?' {
            longest = longest.max(current);
            current = 0;
        } else if matches!(c, '.' | '!' | '\n') {
            current = 0;
        }
    }
    longest
}
