//! Agent message length rule.

use super::LintContext;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::turn::Turn;

pub fn check(turns: &[Turn], context: &LintContext) -> Vec<TurnLintResult> {
    let max = context.policy.max_chars_per_message;
    let mut results = Vec::new();
    for (index, turn) in turns.iter().enumerate() {
        if !turn.is_agent() || turn.is_error() {
            continue;
        }
        if turn.text.trim().is_empty() {
            // Malformed turn data is an automatic non-pass, never a panic.
            results.push(TurnLintResult::new(
                index,
                vec![LintFinding::fail(LintCode::LengthMax).with_details("empty text")],
            ));
            continue;
        }
        let len = turn.text.chars().count();
        if len > max {
            results.push(TurnLintResult::new(
                index,
                vec![LintFinding::fail(LintCode::LengthMax)
                    .with_details(format!("len={len}, max={max}"))],
            ));
        }
    }
    results
}
