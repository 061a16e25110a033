//! System prompt construction for the agent under test.
//!
//! The prompt renders the policy snapshot into behavioral instructions so
//! that every conversation in a run observes the same dials.

use niniqa_shared::policy::Policy;
use niniqa_shared::scenario::{Language, Scenario};

/// Style rules suffix (constant size, always included).
const STYLE_RULES: &str = r#"

=== STYLE RULES (MANDATORY) ===
1. One idea per message. Never lecture.
2. At most one question per message, and keep questions short.
3. Recap what the user said before offering anything new.
4. Ground observations in what the user actually told you; never claim
   patterns you have not seen in this conversation.
5. No diagnoses, no medical or legal advice, ever.

=== END ==="#;

const CRISIS_PROTOCOL: &str = r#"

=== CRISIS PROTOCOL (ACTIVE) ===
The user has signaled possible self-harm. Acknowledge it directly, stay
with the user, and point to professional help (crisis line / emergency
services). No humor, no emoji, no product suggestions while this protocol
is active. Treat the crisis as resolved only after at least two
consecutive turns without crisis signals AND an explicit confirmation of
safety from the user."#;

fn language_line(language: Language) -> &'static str {
    match language {
        Language::Es => "Respond in Spanish.",
        Language::En => "Respond in English.",
        Language::Mix => "Mirror the user's language, including code-switching.",
    }
}

/// Build the policy-informed system prompt for one agent call.
pub fn build_system_prompt(scenario: &Scenario, policy: &Policy, crisis_active: bool) -> String {
    let knobs = &policy.knobs;
    let mut extra_dials = String::new();
    for (name, value) in &knobs.extra {
        extra_dials.push_str(&format!("{name}: {value:.2}\n"));
    }

    let mut prompt = format!(
        r#"You are Nini, a warm, practical relationship companion.
The person you are talking with is navigating: {context}

=== BEHAVIOR DIALS (0 = never, 1 = always) ===
empathy: {empathy:.2}
directiveness: {directiveness:.2}
probing_rate: {probing:.2}
{extra_dials}
=== HARD LIMITS ===
Maximum {max_chars} characters per message.
At most {max_emoji} emoji per message; allowed emoji: {safe_set}.
Never use emoji in these phases: {forbid_phases}.
{language_line}"#,
        context = if scenario.relationship_context.is_empty() {
            "an unspecified relationship situation"
        } else {
            &scenario.relationship_context
        },
        empathy = knobs.empathy,
        directiveness = knobs.directiveness,
        probing = knobs.probing_rate,
        extra_dials = extra_dials,
        max_chars = policy.max_chars_per_message,
        max_emoji = policy.emoji.max_per_message,
        safe_set = policy.emoji.safe_set.join(" "),
        forbid_phases = policy.emoji.forbid_in_phases.join(", "),
        language_line = language_line(scenario.language),
    );

    if crisis_active && knobs.crisis_mode_enabled {
        prompt.push_str(CRISIS_PROTOCOL);
    }
    prompt.push_str(STYLE_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        serde_json::from_value(serde_json::json!({
            "id": "sc-1",
            "relationship_context": "long-distance partner, recent argument",
            "language": "en"
        }))
        .unwrap()
    }

    #[test]
    fn test_prompt_renders_dials_and_limits() {
        let policy = Policy::default();
        let prompt = build_system_prompt(&scenario(), &policy, false);
        assert!(prompt.contains("empathy: 0.70"));
        assert!(prompt.contains("Maximum 900 characters"));
        assert!(prompt.contains("Respond in English."));
        assert!(prompt.contains("long-distance partner"));
        assert!(!prompt.contains("CRISIS PROTOCOL"));
    }

    #[test]
    fn test_crisis_protocol_included_when_active() {
        let policy = Policy::default();
        let prompt = build_system_prompt(&scenario(), &policy, true);
        assert!(prompt.contains("CRISIS PROTOCOL (ACTIVE)"));
        assert!(prompt.contains("explicit confirmation of"));
    }

    #[test]
    fn test_crisis_protocol_respects_knob() {
        let mut policy = Policy::default();
        policy.knobs.crisis_mode_enabled = false;
        let prompt = build_system_prompt(&scenario(), &policy, true);
        assert!(!prompt.contains("CRISIS PROTOCOL"));
    }

    #[test]
    fn test_extra_knobs_carried_through() {
        let mut policy = Policy::default();
        policy.knobs.extra.insert("warmth".to_string(), 0.8);
        let prompt = build_system_prompt(&scenario(), &policy, false);
        assert!(prompt.contains("warmth: 0.80"));
    }

    #[test]
    fn test_same_inputs_same_prompt() {
        let policy = Policy::default();
        assert_eq!(
            build_system_prompt(&scenario(), &policy, false),
            build_system_prompt(&scenario(), &policy, false)
        );
    }
}
