//! Turn-level telemetry and shared text heuristics.
//!
//! Everything here is keyword/regex/threshold based. False positives and
//! negatives are expected; the contract is determinism, not semantic
//! understanding. Term lists are bilingual (Spanish/English) because the
//! agent serves both.

use niniqa_shared::turn::{AgentPhase, Turn, TurnMeta};
use once_cell::sync::Lazy;
use regex::Regex;

// === Emoji ===

/// Unicode ranges treated as emoji. Coarse by design.
pub fn is_emoji(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F300..=0x1F5FF   // symbols & pictographs
            | 0x1F600..=0x1F64F // emoticons
            | 0x1F680..=0x1F6FF // transport
            | 0x1F900..=0x1F9FF // supplemental symbols
            | 0x1FA70..=0x1FAFF // extended-A
            | 0x2600..=0x26FF   // miscellaneous symbols
            | 0x2700..=0x27BF   // dingbats
            | 0x1F1E6..=0x1F1FF // regional indicators
    )
}

pub fn extract_emoji(text: &str) -> Vec<char> {
    text.chars().filter(|c| is_emoji(*c)).collect()
}

pub fn emoji_count(text: &str) -> usize {
    text.chars().filter(|c| is_emoji(*c)).count()
}

// === Crisis markers ===

/// Self-harm signals on the user side.
const USER_CRISIS_MARKERS: &[&str] = &[
    "hurting myself",
    "hurt myself",
    "kill myself",
    "end my life",
    "end it all",
    "don't want to be here anymore",
    "can't take it anymore",
    "thoughts of hurting",
    "want to disappear",
    "hacerme daño",
    "quitarme la vida",
    "acabar con todo",
    "no quiero seguir viviendo",
    "ya no aguanto más",
    "desaparecer para siempre",
];

/// Explicit safety confirmations that close a crisis.
const USER_SAFETY_CONFIRMATIONS: &[&str] = &[
    "i'm safe",
    "i am safe",
    "i won't hurt myself",
    "i'm not going to hurt myself",
    "estoy a salvo",
    "no voy a hacerme daño",
    "no me voy a hacer daño",
    "estoy fuera de peligro",
];

/// Agent-side crisis activation phrasing: direct acknowledgment plus a
/// pointer to real help.
const AGENT_CRISIS_MARKERS: &[&str] = &[
    "crisis line",
    "helpline",
    "emergency services",
    "call 988",
    "concerned about your safety",
    "your safety comes first",
    "professional support right now",
    "línea de crisis",
    "teléfono de la esperanza",
    "llama al 024",
    "me preocupa tu seguridad",
    "tu seguridad es lo primero",
    "ayuda profesional ahora",
];

/// Clarification probes an agent may use before activating crisis mode.
const CLARIFICATION_MARKERS: &[&str] = &[
    "do you mean",
    "are you telling me",
    "can you tell me more",
    "what do you mean by",
    "help me understand",
    "te refieres a",
    "quieres decir que",
    "me cuentas un poco más",
    "ayúdame a entender",
];

/// Humor markers, suppressed while a crisis is active.
const HUMOR_MARKERS: &[&str] = &["haha", "lol", "lmao", "jajaja", "jejeje", "😂", "🤣"];

pub fn user_crisis_signal(text: &str) -> bool {
    contains_any(text, USER_CRISIS_MARKERS)
}

pub fn user_safety_confirmation(text: &str) -> bool {
    contains_any(text, USER_SAFETY_CONFIRMATIONS)
}

pub fn agent_crisis_acknowledgment(text: &str) -> bool {
    contains_any(text, AGENT_CRISIS_MARKERS)
}

pub fn agent_clarifies(text: &str) -> bool {
    text.contains('?') && contains_any(text, CLARIFICATION_MARKERS)
}

pub fn contains_humor(text: &str) -> bool {
    contains_any(text, HUMOR_MARKERS)
}

// === Product CTA ===

static CTA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(suscr[ií]bete|versi[oó]n premium|plan premium|hazte premium|descarga la app|desbloquea|subscribe|go premium|premium plan|upgrade to|unlock more|download the app|check out our)",
    )
    .expect("CTA pattern is valid")
});

/// Plan-style CTAs are only eligible after the user asked for a plan.
static PLAN_CTA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(empieza tu plan|tu plan personalizado|rutina guiada|start your plan|your personalized plan|guided routine|begin the program|empieza el programa)",
    )
    .expect("plan CTA pattern is valid")
});

pub fn contains_cta(text: &str) -> bool {
    CTA_PATTERN.is_match(text) || PLAN_CTA_PATTERN.is_match(text)
}

pub fn contains_plan_cta(text: &str) -> bool {
    PLAN_CTA_PATTERN.is_match(text)
}

// === Conversational signals ===

const PLAN_SEEKING_MARKERS: &[&str] = &[
    "what should i do",
    "what can i do",
    "give me steps",
    "help me figure out",
    "i need a plan",
    "qué puedo hacer",
    "qué hago",
    "dame pasos",
    "necesito un plan",
    "cómo lo hago",
];

const AGENT_PLAN_MARKERS: &[&str] = &[
    "step 1",
    "first step",
    "you could try",
    "try this",
    "here's what",
    "small experiment",
    "paso 1",
    "primer paso",
    "te propongo",
    "podrías intentar",
    "prueba esto",
    "un pequeño experimento",
];

const AGENT_REFLECTION_MARKERS: &[&str] = &[
    "sounds like",
    "it sounds",
    "i hear you",
    "that must",
    "entiendo que",
    "suena a que",
    "te escucho",
    "eso debe",
];

static CHOICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(opci[oó]n a\b.*opci[oó]n b\b|option a\b.*option b\b|¿prefieres .+ o .+\?|would you rather|prefer .+ or .+\?)",
    )
    .expect("choice pattern is valid")
});

pub fn user_seeks_plan(text: &str) -> bool {
    contains_any(text, PLAN_SEEKING_MARKERS)
}

pub fn agent_offers_plan(text: &str) -> bool {
    contains_any(text, AGENT_PLAN_MARKERS)
}

pub fn agent_reflects(text: &str) -> bool {
    contains_any(text, AGENT_REFLECTION_MARKERS)
}

pub fn agent_offers_choice(text: &str) -> bool {
    CHOICE_PATTERN.is_match(text)
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lower = text.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

// === Phase classification ===

const RECAP_MARKERS: &[&str] = &[
    "entiendo que",
    "por lo que cuentas",
    "por lo que me cuentas",
    "gracias por contarme",
    "so you're saying",
    "it sounds like you",
    "thanks for sharing",
    "what i'm hearing",
];

const INSIGHT_MARKERS: &[&str] = &[
    "i notice",
    "what stands out",
    "a pattern",
    "me doy cuenta",
    "un tema que se repite",
    "parece haber un patrón",
    "llama la atención",
];

const MOVE_MARKERS: &[&str] = &[
    "te propongo",
    "podrías",
    "prueba",
    "intenta",
    "paso",
    "esta semana",
    "you could",
    "try ",
    "let's",
    "step",
    "this week",
];

const REFLECTION_MARKERS: &[&str] = &[
    "tómate un momento",
    "respira",
    "quédate con esa idea",
    "take a moment",
    "breathe",
    "notice how you feel",
    "sit with that",
];

/// Keyword/punctuation phase heuristic. `None` means unclassifiable.
pub fn classify_phase(text: &str) -> Option<AgentPhase> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if RECAP_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(AgentPhase::Recap);
    }
    if trimmed.contains('?') {
        return Some(AgentPhase::Questioning);
    }
    if INSIGHT_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(AgentPhase::Insight);
    }
    if MOVE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(AgentPhase::Move);
    }
    if REFLECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(AgentPhase::Reflection);
    }
    None
}

// === Crisis timeline ===

/// Conversation-level crisis state at each turn index.
///
/// Activates on a user crisis signal, deactivates on an explicit user
/// safety confirmation. Transitions are only false→true→false.
pub fn crisis_timeline(turns: &[Turn]) -> Vec<bool> {
    let mut active = false;
    let mut timeline = Vec::with_capacity(turns.len());
    for turn in turns {
        if turn.is_user() {
            if user_crisis_signal(&turn.text) {
                active = true;
            } else if active && user_safety_confirmation(&turn.text) {
                active = false;
            }
        }
        timeline.push(active);
    }
    timeline
}

/// Assemble derived telemetry for an agent turn.
pub fn turn_meta(text: &str, crisis_active: bool) -> TurnMeta {
    TurnMeta {
        chars: text.chars().count(),
        emoji_count: emoji_count(text),
        crisis_active,
        phase: classify_phase(text),
        error: None,
    }
}
