//! The simulated user: a deterministic persona state machine.
//!
//! One instance drives exactly one conversation and is never shared.
//! All variety flows through the instance's own seeded generator, so the
//! same `(scenario, seed)` pair reproduces the same turns bit for bit
//! given a fixed agent response sequence.

pub mod phrases;
pub mod style;

use crate::rng::{seed_from_str, SeededRng};
use crate::telemetry;
use niniqa_shared::scenario::{CrisisSignals, Language, Scenario};
use niniqa_shared::turn::Turn;
use tracing::debug;

/// Conversation phases the persona moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaPhase {
    Opening,
    Exploring,
    Pressing,
    Deciding,
    Wrap,
}

/// What the persona is trying to do with its next utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intention {
    Vent,
    AskClarify,
    Challenge,
    SeekPlan,
    Deflect,
    Reflect,
    Close,
}

/// Progress through the scenario's goal list.
#[derive(Debug, Clone)]
pub struct Beat {
    pub name: String,
    pub index: usize,
    pub total: usize,
}

/// Accumulated persona state. Mutated only by its own turn generation.
#[derive(Debug)]
pub struct SimulatedUser {
    scenario: Scenario,
    rng: SeededRng,
    max_turns: usize,
    phase: PersonaPhase,
    turn_count: usize,
    satisfaction: f32,
    turns_without_progress: u32,
    crisis_mode_active: bool,
    crisis_acknowledged: bool,
    calm_turns: u32,
    crisis_resolved: bool,
    ambiguous_disclosed: bool,
    ab_choice_pending: bool,
    ab_choice_accepted: bool,
    beat: Beat,
    memory: Vec<String>,
}

impl SimulatedUser {
    pub fn new(scenario: &Scenario, seed: u64, max_turns: usize) -> Self {
        let beat = Beat {
            name: scenario
                .goals
                .first()
                .cloned()
                .unwrap_or_else(|| default_goal(scenario.language).to_string()),
            index: 0,
            total: scenario.goals.len().max(1),
        };
        Self {
            scenario: scenario.clone(),
            rng: SeededRng::new(seed ^ seed_from_str(&scenario.id)),
            max_turns: max_turns.max(1),
            phase: PersonaPhase::Opening,
            turn_count: 0,
            satisfaction: 0.0,
            turns_without_progress: 0,
            crisis_mode_active: false,
            crisis_acknowledged: false,
            calm_turns: 0,
            crisis_resolved: false,
            ambiguous_disclosed: false,
            ab_choice_pending: false,
            ab_choice_accepted: false,
            beat,
            memory: Vec::new(),
        }
    }

    pub fn phase(&self) -> PersonaPhase {
        self.phase
    }

    pub fn satisfaction(&self) -> f32 {
        self.satisfaction
    }

    pub fn crisis_mode_active(&self) -> bool {
        self.crisis_mode_active
    }

    pub fn beat(&self) -> &Beat {
        &self.beat
    }

    pub fn memory(&self) -> &[String] {
        &self.memory
    }

    /// First turn of the conversation, from the scenario seed utterance.
    pub fn open(&mut self) -> Turn {
        let language = self.pick_language();
        let base = match self.scenario.seed_utterances.first() {
            Some(utterance) => utterance.clone(),
            None => {
                let bank = phrases::opening_fallback(language);
                let template = self
                    .rng
                    .pick(bank)
                    .copied()
                    .unwrap_or(phrases::FALLBACK_CLARIFY);
                self.render_template(template, language)
            }
        };

        let with_crisis = style::inject_crisis(
            base,
            self.scenario.crisis_signals,
            language,
            &mut self.rng,
        );
        if self.scenario.crisis_signals == CrisisSignals::Clear {
            self.crisis_mode_active = true;
        }

        if !self.scenario.relationship_context.is_empty() {
            self.memory.push(self.scenario.relationship_context.clone());
        }

        let text = style::apply(with_crisis, &self.scenario, language, &mut self.rng);
        self.turn_count = 1;
        Turn::user(text)
    }

    /// Produce the next user turn, or `None` to end the conversation.
    pub fn next(&mut self, last_agent: &Turn) -> Option<Turn> {
        // Post-emission terminal flags first.
        if self.ab_choice_accepted {
            debug!("Persona ending: A/B choice accepted");
            return None;
        }
        if self.crisis_resolved && !self.crisis_mode_active {
            debug!("Persona ending: crisis resolved with safety confirmation");
            return None;
        }
        if self.turn_count >= self.max_turns {
            debug!("Persona ending: turn cap {} reached", self.max_turns);
            return None;
        }

        let reply = if last_agent.is_error() {
            ""
        } else {
            last_agent.text.as_str()
        };
        self.observe(reply);

        if self.satisfaction >= 0.9 {
            debug!("Persona ending: satisfaction {:.2}", self.satisfaction);
            return None;
        }

        let language = self.pick_language();

        // Ambiguous scenarios disclose when the agent probes.
        if self.scenario.crisis_signals == CrisisSignals::Ambiguous
            && !self.crisis_mode_active
            && !self.ambiguous_disclosed
            && !self.crisis_resolved
            && telemetry::agent_clarifies(reply)
        {
            self.ambiguous_disclosed = true;
            self.crisis_mode_active = true;
            let leadin = self
                .rng
                .pick(phrases::crisis_disclosure_leadin(language))
                .copied()
                .unwrap_or_default();
            let phrase = self
                .rng
                .pick(phrases::crisis_explicit(language))
                .copied()
                .unwrap_or_default();
            let text = style::apply(
                format!("{leadin} {phrase}"),
                &self.scenario,
                language,
                &mut self.rng,
            );
            self.turn_count += 1;
            return Some(Turn::user(text));
        }

        // Crisis exit: two calm turns after acknowledgment, then an explicit
        // safety confirmation.
        if self.crisis_mode_active && self.crisis_acknowledged && self.calm_turns >= 2 {
            self.crisis_mode_active = false;
            self.crisis_resolved = true;
            let confirmation = self
                .rng
                .pick(phrases::safety_confirmation(language))
                .copied()
                .unwrap_or(phrases::FALLBACK_CLARIFY);
            let text = style::apply(
                confirmation.to_string(),
                &self.scenario,
                language,
                &mut self.rng,
            );
            self.turn_count += 1;
            return Some(Turn::user(text));
        }

        self.phase = self.advance_phase();
        let intention = self.choose_intention();
        debug!(
            "Persona turn {}: phase={:?} intention={:?} satisfaction={:.2}",
            self.turn_count + 1,
            self.phase,
            intention,
            self.satisfaction
        );

        let text = self.render(intention, language);
        self.turn_count += 1;
        Some(Turn::user(text))
    }

    /// Update satisfaction and progress counters from the agent's reply.
    fn observe(&mut self, reply: &str) {
        if self.crisis_mode_active {
            let acknowledged_now = telemetry::agent_crisis_acknowledgment(reply);
            if acknowledged_now && !self.crisis_acknowledged {
                self.crisis_acknowledged = true;
            } else if self.crisis_acknowledged {
                self.calm_turns += 1;
            }
            // Satisfaction does not move while a crisis is open.
            return;
        }

        let mut progressed = false;
        if telemetry::agent_offers_plan(reply) {
            self.satisfaction += 0.3;
            self.advance_beat();
            progressed = true;
        }
        if telemetry::agent_offers_choice(reply) {
            self.satisfaction += 0.15;
            self.ab_choice_pending = true;
            progressed = true;
        }
        if telemetry::agent_reflects(reply) {
            self.satisfaction += 0.1;
            progressed = true;
        } else if telemetry::agent_clarifies(reply) {
            self.satisfaction += 0.05;
            progressed = true;
        }
        self.satisfaction = self.satisfaction.clamp(0.0, 1.0);

        if progressed {
            self.turns_without_progress = 0;
        } else {
            self.turns_without_progress += 1;
        }
    }

    /// Fixed-threshold phase transitions, checked in priority order.
    fn advance_phase(&self) -> PersonaPhase {
        if self.turn_count >= 8 || self.satisfaction >= 0.8 {
            PersonaPhase::Wrap
        } else if self.ab_choice_pending {
            PersonaPhase::Deciding
        } else if self.turns_without_progress >= 2 {
            PersonaPhase::Pressing
        } else if self.turn_count >= 3 {
            PersonaPhase::Exploring
        } else {
            PersonaPhase::Opening
        }
    }

    /// State-conditioned weighted intention choice. Crisis forces
    /// reflect/deflect only.
    fn choose_intention(&mut self) -> Intention {
        if self.crisis_mode_active {
            return if self.rng.chance(0.6) {
                Intention::Reflect
            } else {
                Intention::Deflect
            };
        }

        let (candidates, weights): (&[Intention], &[f32]) = match self.phase {
            PersonaPhase::Opening => (
                &[Intention::Vent, Intention::AskClarify, Intention::Deflect],
                &[0.5, 0.3, 0.2],
            ),
            PersonaPhase::Exploring => (
                &[
                    Intention::AskClarify,
                    Intention::Vent,
                    Intention::SeekPlan,
                    Intention::Challenge,
                ],
                &[0.3, 0.25, 0.25, 0.2],
            ),
            PersonaPhase::Pressing => (
                &[Intention::Challenge, Intention::SeekPlan, Intention::Vent],
                &[0.4, 0.35, 0.25],
            ),
            PersonaPhase::Deciding => (
                &[Intention::Close, Intention::AskClarify, Intention::Challenge],
                &[0.6, 0.25, 0.15],
            ),
            PersonaPhase::Wrap => (
                &[Intention::Close, Intention::Reflect],
                &[0.6, 0.4],
            ),
        };
        let index = self.rng.weighted(weights);
        candidates.get(index).copied().unwrap_or(Intention::AskClarify)
    }

    fn render(&mut self, intention: Intention, language: Language) -> String {
        // Accepting an offered choice closes the decision.
        if intention == Intention::Close
            && self.ab_choice_pending
            && self.phase == PersonaPhase::Deciding
        {
            self.ab_choice_accepted = true;
            let template = self
                .rng
                .pick(phrases::accept_choice(language))
                .copied()
                .unwrap_or(phrases::FALLBACK_CLARIFY);
            return style::apply(
                template.to_string(),
                &self.scenario,
                language,
                &mut self.rng,
            );
        }

        if intention == Intention::Close {
            // Winding down nudges satisfaction toward the exit threshold.
            self.satisfaction = (self.satisfaction + 0.05).clamp(0.0, 1.0);
        }

        let bank = phrases::intention_templates(intention, language);
        let template = self
            .rng
            .pick(bank)
            .copied()
            .unwrap_or(phrases::FALLBACK_CLARIFY);
        let rendered = self.render_template(template, language);

        if matches!(intention, Intention::Vent | Intention::SeekPlan)
            && !self.memory.contains(&self.beat.name)
        {
            self.memory.push(self.beat.name.clone());
        }

        style::apply(rendered, &self.scenario, language, &mut self.rng)
    }

    fn render_template(&self, template: &str, language: Language) -> String {
        let context = if self.scenario.relationship_context.is_empty() {
            default_context(language)
        } else {
            self.scenario.relationship_context.as_str()
        };
        phrases::render(template, &self.beat.name, context)
    }

    fn advance_beat(&mut self) {
        if self.beat.index + 1 < self.scenario.goals.len() {
            self.beat.index += 1;
            self.beat.name = self.scenario.goals[self.beat.index].clone();
        }
    }

    fn pick_language(&mut self) -> Language {
        match self.scenario.language {
            Language::Mix => {
                if self.rng.chance(0.5) {
                    Language::Es
                } else {
                    Language::En
                }
            }
            fixed => fixed,
        }
    }
}

fn default_goal(language: Language) -> &'static str {
    if matches!(language, Language::En) {
        "making sense of all this"
    } else {
        "ordenar lo que siento"
    }
}

fn default_context(language: Language) -> &'static str {
    if matches!(language, Language::En) {
        "this relationship"
    } else {
        "esta relación"
    }
}
