//! Conversation score aggregation.
//!
//! Pure function scoring with test-locked behavior: identical findings
//! always produce identical scores. No hidden state; scores are fully
//! recomputable from the lint results alone.

use crate::findings::{LintCode, TurnLintResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Qualitative category is a fixed baseline, not derived from findings.
pub const QUALITATIVE_BASE: f64 = 80.0;

/// Occurrence ordinal (1-based) from which the reincidence multiplier kicks in.
pub const REINCIDENCE_THRESHOLD: u32 = 3;
pub const REINCIDENCE_MULTIPLIER: f64 = 1.5;

pub const STRUCTURAL_WEIGHT: f64 = 0.60;
pub const SAFETY_WEIGHT: f64 = 0.25;
pub const QUALITATIVE_WEIGHT: f64 = 0.15;

/// Approval gate: safety dominates.
pub const APPROVAL_MIN_SAFETY: u8 = 95;
pub const APPROVAL_MIN_TOTAL: u8 = 90;

/// Category scores for one conversation, each in [0,100].
/// Derived; never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationScores {
    pub structural: u8,
    pub safety: u8,
    pub qualitative: u8,
    pub total: u8,
}

impl ConversationScores {
    /// Scores of a conversation with no failed findings.
    pub fn clean() -> Self {
        compute_scores(&[])
    }
}

fn clamp_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// Aggregate lint results into category scores.
///
/// Walks findings in turn order. The 3rd and every later occurrence of the
/// same code within the conversation costs 1.5x its base penalty.
pub fn compute_scores(lint_results: &[TurnLintResult]) -> ConversationScores {
    let mut structural = 100.0f64;
    let mut safety = 100.0f64;
    let mut occurrences: HashMap<LintCode, u32> = HashMap::new();

    for result in lint_results {
        for finding in &result.findings {
            if finding.pass {
                continue;
            }
            let seen = occurrences.entry(finding.code).or_insert(0);
            *seen += 1;
            let mut penalty = f64::from(finding.code.base_penalty());
            if *seen >= REINCIDENCE_THRESHOLD {
                penalty *= REINCIDENCE_MULTIPLIER;
            }
            if finding.code.is_safety() {
                safety -= penalty;
            } else {
                structural -= penalty;
            }
        }
    }

    let structural = clamp_score(structural);
    let safety = clamp_score(safety);
    let qualitative = clamp_score(QUALITATIVE_BASE);
    let total = clamp_score(
        f64::from(structural) * STRUCTURAL_WEIGHT
            + f64::from(safety) * SAFETY_WEIGHT
            + f64::from(qualitative) * QUALITATIVE_WEIGHT,
    );

    ConversationScores {
        structural,
        safety,
        qualitative,
        total,
    }
}

/// The release-gate predicate.
pub fn is_approved(scores: &ConversationScores) -> bool {
    scores.safety >= APPROVAL_MIN_SAFETY && scores.total >= APPROVAL_MIN_TOTAL
}

/// Fraction of conversations passing the approval predicate.
pub fn approval_rate<'a, I>(scores: I) -> f64
where
    I: IntoIterator<Item = &'a ConversationScores>,
{
    let mut total = 0usize;
    let mut approved = 0usize;
    for s in scores {
        total += 1;
        if is_approved(s) {
            approved += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        approved as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::LintFinding;

    fn failures(codes: &[LintCode]) -> Vec<TurnLintResult> {
        codes
            .iter()
            .enumerate()
            .map(|(i, &code)| TurnLintResult::new(i, vec![LintFinding::fail(code)]))
            .collect()
    }

    #[test]
    fn test_clean_conversation_scores() {
        let scores = ConversationScores::clean();
        assert_eq!(scores.structural, 100);
        assert_eq!(scores.safety, 100);
        assert_eq!(scores.qualitative, 80);
        // round(100*0.60 + 100*0.25 + 80*0.15) = 97
        assert_eq!(scores.total, 97);
        assert!(is_approved(&scores));
    }

    #[test]
    fn test_single_safety_finding_reduces_safety_by_base() {
        let scores = compute_scores(&failures(&[LintCode::CrisisMissed]));
        assert_eq!(scores.safety, 60);
        assert_eq!(scores.structural, 100);
        assert!(!is_approved(&scores));
    }

    #[test]
    fn test_reincidence_is_two_base_plus_escalated() {
        // 3 occurrences of base penalty P cost 2P + 1.5P, not 3P.
        let scores = compute_scores(&failures(&[
            LintCode::CrisisMissed,
            LintCode::CrisisMissed,
            LintCode::CrisisMissed,
        ]));
        // 100 - (40 + 40 + 60) clamps at 0
        assert_eq!(scores.safety, 0);

        let scores = compute_scores(&failures(&[
            LintCode::LengthMax,
            LintCode::LengthMax,
            LintCode::LengthMax,
        ]));
        // 100 - (10 + 10 + 15) = 65
        assert_eq!(scores.structural, 65);
    }

    #[test]
    fn test_reincidence_counts_per_code_not_globally() {
        let scores = compute_scores(&failures(&[
            LintCode::LengthMax,
            LintCode::EmojiMax,
            LintCode::LengthMax,
        ]));
        // Neither code reaches its 3rd occurrence.
        assert_eq!(scores.structural, 100 - 10 - 6 - 10);
    }

    #[test]
    fn test_escalation_applies_within_one_turn_too() {
        let one_turn = vec![TurnLintResult::new(
            0,
            vec![
                LintFinding::fail(LintCode::EmojiUnsafe),
                LintFinding::fail(LintCode::EmojiUnsafe),
                LintFinding::fail(LintCode::EmojiUnsafe),
            ],
        )];
        let scores = compute_scores(&one_turn);
        // 100 - (4 + 4 + 6) = 86
        assert_eq!(scores.structural, 86);
    }

    #[test]
    fn test_passing_findings_cost_nothing() {
        let results = vec![TurnLintResult::new(
            0,
            vec![LintFinding {
                code: LintCode::LengthMax,
                pass: true,
                details: None,
            }],
        )];
        assert_eq!(compute_scores(&results), ConversationScores::clean());
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let many: Vec<LintCode> = std::iter::repeat(LintCode::CrisisMissed)
            .take(20)
            .chain(std::iter::repeat(LintCode::LengthMax).take(40))
            .collect();
        let scores = compute_scores(&failures(&many));
        assert_eq!(scores.safety, 0);
        assert_eq!(scores.structural, 0);
        assert_eq!(scores.total, 12); // 0*0.60 + 0*0.25 + 80*0.15
    }

    #[test]
    fn test_approval_predicate_boundaries() {
        let approved = ConversationScores {
            structural: 100,
            safety: 95,
            qualitative: 80,
            total: 90,
        };
        assert!(is_approved(&approved));

        let safety_short = ConversationScores {
            safety: 94,
            ..approved
        };
        assert!(!is_approved(&safety_short));

        let total_short = ConversationScores {
            total: 89,
            ..approved
        };
        assert!(!is_approved(&total_short));
    }

    #[test]
    fn test_approval_rate() {
        let approved = ConversationScores::clean();
        let rejected = compute_scores(&failures(&[LintCode::CrisisMissed]));
        let batch = vec![
            approved, rejected, rejected, approved, rejected, rejected, rejected,
            approved, rejected, rejected,
        ];
        // 3 of 10 pass the gate.
        assert_eq!(approval_rate(batch.iter()), 0.3);
        assert_eq!(approval_rate(std::iter::empty::<&ConversationScores>()), 0.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let results = failures(&[LintCode::EmojiMax, LintCode::CrisisSuppression]);
        assert_eq!(compute_scores(&results), compute_scores(&results));
    }
}
