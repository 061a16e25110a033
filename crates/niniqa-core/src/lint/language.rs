//! Cross-language contamination in fixed-language conversations.
//!
//! Marker words are common function words unlikely to appear in the other
//! language; two distinct foreign markers in one agent turn is a finding.
//! `mix` scenarios skip this check entirely.

use super::LintContext;
use niniqa_shared::findings::{LintCode, LintFinding, TurnLintResult};
use niniqa_shared::scenario::Language;
use niniqa_shared::turn::Turn;

const EN_MARKERS: &[&str] = &[
    "the", "and", "you", "feel", "with", "that", "how", "thanks", "your", "about",
];

const ES_MARKERS: &[&str] = &[
    "que", "pero", "porque", "siento", "contigo", "gracias", "cómo", "para", "esto", "sobre",
];

/// Distinct foreign markers required before flagging.
pub const MIN_FOREIGN_MARKERS: usize = 2;

pub fn check(turns: &[Turn], context: &LintContext) -> Vec<TurnLintResult> {
    let foreign: &[&str] = match context.language {
        Language::Mix => return Vec::new(),
        Language::Es => EN_MARKERS,
        Language::En => ES_MARKERS,
    };

    let mut results = Vec::new();
    for (index, turn) in turns.iter().enumerate() {
        if !turn.is_agent() || turn.is_error() {
            continue;
        }
        let words: Vec<String> = turn
            .text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .collect();
        let mut hits: Vec<&str> = foreign
            .iter()
            .copied()
            .filter(|marker| words.iter().any(|w| w == marker))
            .collect();
        hits.dedup();
        if hits.len() >= MIN_FOREIGN_MARKERS {
            results.push(TurnLintResult::new(
                index,
                vec![LintFinding::fail(LintCode::LanguageMix)
                    .with_details(format!("foreign markers: {}", hits.join(", ")))],
            ));
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use niniqa_shared::policy::Policy;
    use niniqa_shared::turn::TurnMeta;

    fn context(language: Language) -> LintContext {
        LintContext::new(Policy::default(), language)
    }

    fn agent(text: &str) -> Turn {
        Turn::agent(text, TurnMeta::default())
    }

    #[test]
    fn test_english_in_spanish_conversation() {
        let turns = vec![agent("Entiendo. How do you feel about eso?")];
        let results = check(&turns, &context(Language::Es));
        assert_eq!(results[0].findings[0].code, LintCode::LanguageMix);
    }

    #[test]
    fn test_spanish_in_english_conversation() {
        let turns = vec![agent("I get it, pero gracias for telling me.")];
        let results = check(&turns, &context(Language::En));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_single_foreign_word_tolerated() {
        let turns = vec![agent("Entiendo, gracias por confiar en mí. Ok.")];
        assert!(check(&turns, &context(Language::Es)).is_empty());
    }

    #[test]
    fn test_mix_language_skips_check() {
        let turns = vec![agent("Entiendo. How do you feel about eso?")];
        assert!(check(&turns, &context(Language::Mix)).is_empty());
    }

    #[test]
    fn test_pure_language_passes() {
        let turns = vec![agent("Entiendo que esto pesa mucho y quiero acompañarte.")];
        assert!(check(&turns, &context(Language::Es)).is_empty());
    }
}
