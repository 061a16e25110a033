//! Generalized claims must be grounded in user material.

use super::LintContext;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::turn::Turn;

/// A user turn at least this long counts as grounding material.
pub const MIN_GROUNDING_CHARS: usize = 80;

const GENERALIZATION_MARKERS: &[&str] = &[
    "you always",
    "you never",
    "your pattern",
    "every time you",
    "siempre haces",
    "nunca haces",
    "tu patrón",
    "cada vez que tú",
    "siempre acabas",
    "always end up",
];

pub fn check(turns: &[Turn], _context: &LintContext) -> Vec<TurnLintResult> {
    let mut results = Vec::new();
    for (index, turn) in turns.iter().enumerate() {
        if !turn.is_agent() || turn.is_error() {
            continue;
        }
        let lower = turn.text.to_lowercase();
        let Some(marker) = GENERALIZATION_MARKERS.iter().find(|m| lower.contains(*m)) else {
            continue;
        };
        let grounded = turns[..index]
            .iter()
            .any(|t| t.is_user() && t.text.chars().count() >= MIN_GROUNDING_CHARS);
        if !grounded {
            results.push(TurnLintResult::new(
                index,
                vec![LintFinding::fail(LintCode::EvidenceMissing)
                    .with_details(format!("generalized claim '{marker}' without grounding"))],
            ));
        }
    }
    results
}
