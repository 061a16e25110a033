//! Product call-to-action rules.

use super::LintContext;
use crate::telemetry;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::turn::Turn;

pub fn check(turns: &[Turn], _context: &LintContext) -> Vec<TurnLintResult> {
    let timeline = telemetry::crisis_timeline(turns);
    let mut results = Vec::new();
    let mut plan_sought = false;

    for (index, turn) in turns.iter().enumerate() {
        if turn.is_user() {
            if telemetry::user_seeks_plan(&turn.text) {
                plan_sought = true;
            }
            continue;
        }
        if turn.is_error() || !telemetry::contains_cta(&turn.text) {
            continue;
        }

        let mut findings = Vec::new();
        if timeline[index] {
            findings.push(
                LintFinding::fail(LintCode::CtaDuringCrisis)
                    .with_details("cta while crisis active"),
            );
        }
        if telemetry::contains_plan_cta(&turn.text) && !plan_sought {
            findings.push(
                LintFinding::fail(LintCode::CtaIneligible)
                    .with_details("plan-style cta without prior plan-seeking"),
            );
        }
        if !findings.is_empty() {
            results.push(TurnLintResult::new(index, findings));
        }
    }
    results
}
