//! Styling pipeline applied to every persona utterance.
//!
//! Order is fixed: crisis injection happens where the caller decides;
//! intensity, cognitive noise, and language mix always run last, in that
//! order, so a seed renders the same surface form every time.

use crate::rng::SeededRng;
use niniqa_shared::scenario::{CrisisSignals, Language, Scenario};

use super::phrases;

const INTENSIFIERS_ES: &[&str] = &["de verdad", "muchísimo", "no puedo evitarlo"];
const INTENSIFIERS_EN: &[&str] = &["honestly", "so much", "I can't help it"];

const SOFTENERS_ES: &[&str] = &["supongo", "quizá", "no estoy segura, pero"];
const SOFTENERS_EN: &[&str] = &["I guess", "maybe", "I'm not sure, but"];

const HEDGES_ES: &[&str] = &["no sé", "o algo así", "creo"];
const HEDGES_EN: &[&str] = &["I don't know", "or something", "I think"];

const MIX_MARKERS_ES: &[&str] = &["¿sabes?", "en fin", "o sea"];
const MIX_MARKERS_EN: &[&str] = &["you know?", "anyway", "for real"];

/// Append a crisis phrase matching the scenario's signal strength.
pub fn inject_crisis(
    text: String,
    signals: CrisisSignals,
    language: Language,
    rng: &mut SeededRng,
) -> String {
    let bank = match signals {
        CrisisSignals::None => return text,
        CrisisSignals::Clear => phrases::crisis_explicit(language),
        CrisisSignals::Ambiguous => phrases::crisis_ambiguous(language),
    };
    let phrase = rng.pick(bank).copied().unwrap_or_default();
    if phrase.is_empty() {
        return text;
    }
    format!("{text} {phrase}")
}

/// Emotional-intensity styling: exclamation and intensifiers high, softening
/// low, untouched in the middle band.
fn apply_intensity(text: String, intensity: f32, language: Language, rng: &mut SeededRng) -> String {
    if intensity >= 0.7 {
        let mut styled = text;
        if let Some(stripped) = styled.strip_suffix('.') {
            styled = format!("{stripped}!");
        }
        if rng.chance(intensity - 0.3) {
            let bank = if matches!(language, Language::En) {
                INTENSIFIERS_EN
            } else {
                INTENSIFIERS_ES
            };
            if let Some(word) = rng.pick(bank) {
                styled = format!("{styled} {word}.");
            }
        }
        styled
    } else if intensity <= 0.3 {
        let mut styled = text.replace('!', ".");
        if rng.chance(0.5) {
            let bank = if matches!(language, Language::En) {
                SOFTENERS_EN
            } else {
                SOFTENERS_ES
            };
            if let Some(word) = rng.pick(bank) {
                styled = format!("{word}... {styled}");
            }
        }
        styled
    } else {
        text
    }
}

/// Cognitive-noise styling: trailing ellipses and hedging clauses.
fn apply_noise(text: String, noise: f32, language: Language, rng: &mut SeededRng) -> String {
    if noise < 0.5 {
        return text;
    }
    let mut styled = text;
    if rng.chance(noise) {
        let bank = if matches!(language, Language::En) {
            HEDGES_EN
        } else {
            HEDGES_ES
        };
        if let Some(hedge) = rng.pick(bank) {
            styled = format!("{styled} {hedge}...");
        }
    } else if rng.chance(noise) {
        styled.push_str("...");
    }
    styled
}

/// Language-mix styling: only `mix` scenarios get cross-language markers.
fn apply_language_mix(text: String, language: Language, rng: &mut SeededRng) -> String {
    if !matches!(language, Language::Mix) {
        return text;
    }
    if !rng.chance(0.6) {
        return text;
    }
    let bank = if rng.chance(0.5) {
        MIX_MARKERS_ES
    } else {
        MIX_MARKERS_EN
    };
    match rng.pick(bank) {
        Some(marker) => format!("{text} {marker}"),
        None => text,
    }
}

/// The full post-processing pipeline minus crisis injection.
pub fn apply(text: String, scenario: &Scenario, base_language: Language, rng: &mut SeededRng) -> String {
    let styled = apply_intensity(text, scenario.intensity(), base_language, rng);
    let styled = apply_noise(styled, scenario.noise(), base_language, rng);
    apply_language_mix(styled, scenario.language, rng)
}
