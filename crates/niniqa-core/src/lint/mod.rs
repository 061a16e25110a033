//! Lint engine: a registry of independent rule checkers.
//!
//! Each checker is a pure function over the full turn list; outputs are
//! merged by turn index with findings concatenated, never overwritten.
//! Adding a checker means appending to the registry. All checks are
//! keyword/regex/threshold based: determinism is the contract, semantic
//! correctness is not.

pub mod boundary;
pub mod cta;
pub mod emoji;
pub mod evidence;
pub mod language;
pub mod length;
pub mod phase;
pub mod safety;

use niniqa_shared::findings::{merge_by_turn, TurnLintResult};
use niniqa_shared::policy::Policy;
use niniqa_shared::scenario::Language;
use niniqa_shared::turn::Turn;
use tracing::debug;

/// Everything a checker may look at besides the turns themselves.
#[derive(Debug, Clone)]
pub struct LintContext {
    pub policy: Policy,
    /// The scenario's target language; `Mix` disables the language check.
    pub language: Language,
}

impl LintContext {
    pub fn new(policy: Policy, language: Language) -> Self {
        Self { policy, language }
    }
}

/// Uniform checker signature.
pub type Checker = fn(&[Turn], &LintContext) -> Vec<TurnLintResult>;

/// The registered checkers, in a fixed order.
pub fn default_checkers() -> Vec<(&'static str, Checker)> {
    vec![
        ("length", length::check as Checker),
        ("emoji", emoji::check),
        ("phase", phase::check),
        ("cta", cta::check),
        ("safety", safety::check),
        ("evidence", evidence::check),
        ("boundary", boundary::check),
        ("language", language::check),
    ]
}

/// Run every registered checker over the same turn list and merge.
pub fn run_all(turns: &[Turn], context: &LintContext) -> Vec<TurnLintResult> {
    let mut per_checker = Vec::new();
    for (name, checker) in default_checkers() {
        let results = checker(turns, context);
        let findings: usize = results.iter().map(|r| r.findings.len()).sum();
        if findings > 0 {
            debug!("Checker {} flagged {} findings", name, findings);
        }
        per_checker.push(results);
    }
    merge_by_turn(per_checker)
}
