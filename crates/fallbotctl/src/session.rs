//! Host session - routes each utterance the way a voice assistant host would.
//!
//! Order per turn:
//! 1. the conversation hook gets the utterance first (`converse`); it also
//!    opens a conversation on begin chat
//! 2. named triggers (begin chat, end chat, reset memory, stop)
//! 3. the fallback chain in priority order
//!
//! When nobody in the chain answers, the host says so itself. A turn that
//! ends the conversation by keyword only reaches the named triggers, never
//! the fallback chain.

use fallbot_common::brain::BrainStorage;
use fallbot_common::config::TriggerConfig;
use fallbot_common::dialog::{seed_from_str, DialogKey};
use fallbot_common::{
    route_trigger, ConverseOutcome, FallbackOrchestrator, FallbotError, MatchingEngine, PriorityRegistry, Result,
    Speaker, Trigger,
};
use tracing::debug;

/// How a turn was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Consumed by the running conversation
    Continued,
    /// An end keyword closed the conversation; nothing was answered
    Ended,
    /// Routed to a named trigger; `handled` says whether it was answered
    Triggered { trigger: Trigger, handled: bool },
    /// Answered by the fallback chain
    Fallback,
    /// Nobody had an answer
    Unanswered,
}

pub struct Session<E, P, S> {
    orchestrator: FallbackOrchestrator<E, P, S>,
    registry: PriorityRegistry,
    triggers: TriggerConfig,
}

impl<E: MatchingEngine, P: Speaker, S: BrainStorage> Session<E, P, S> {
    /// Register the orchestrator and open the session
    pub fn new(mut orchestrator: FallbackOrchestrator<E, P, S>, triggers: TriggerConfig) -> Result<Self> {
        let mut registry = PriorityRegistry::new();
        orchestrator.initialize(&mut registry)?;
        Ok(Self {
            orchestrator,
            registry,
            triggers,
        })
    }

    pub fn turn(&mut self, utterance: &str) -> TurnOutcome {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return TurnOutcome::Unanswered;
        }

        let trigger = route_trigger(utterance, &self.triggers);
        debug!("Routed {:?} to {:?}", utterance, trigger);

        let lang = self.orchestrator.lang().to_string();
        match self.orchestrator.converse_turn(&[utterance.to_string()], &lang) {
            ConverseOutcome::Started { handled } => {
                return TurnOutcome::Triggered {
                    trigger: Trigger::BeginChat,
                    handled,
                }
            }
            ConverseOutcome::Answered { handled: true } => return TurnOutcome::Continued,
            ConverseOutcome::EndedByKeyword => {
                return match trigger {
                    Trigger::None => TurnOutcome::Ended,
                    trigger => self.dispatch(trigger, utterance),
                };
            }
            ConverseOutcome::Answered { handled: false } | ConverseOutcome::Declined => {}
        }

        match trigger {
            Trigger::None => self.fallback(utterance),
            trigger => self.dispatch(trigger, utterance),
        }
    }

    fn dispatch(&mut self, trigger: Trigger, utterance: &str) -> TurnOutcome {
        let handled = match trigger {
            Trigger::BeginChat => self.orchestrator.start_conversation(utterance),
            Trigger::EndChat => self.orchestrator.end_conversation(utterance),
            // failure is already spoken and logged
            Trigger::ResetMemory => self.orchestrator.reset_memory().is_ok(),
            Trigger::Stop => {
                self.orchestrator.stop();
                true
            }
            Trigger::None => return self.fallback(utterance),
        };
        TurnOutcome::Triggered { trigger, handled }
    }

    /// One-shot question: fails when the brain is unavailable
    pub fn ask(&mut self, utterance: &str) -> Result<TurnOutcome> {
        if !self.orchestrator.is_available() {
            return Err(FallbotError::Unavailable);
        }
        Ok(self.turn(utterance))
    }

    pub fn reset(&mut self) -> Result<()> {
        self.orchestrator.reset_memory()
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator<E, P, S> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut FallbackOrchestrator<E, P, S> {
        &mut self.orchestrator
    }

    pub fn registry(&self) -> &PriorityRegistry {
        &self.registry
    }

    /// Deregister and clear the brain; the session answers nothing after this
    pub fn close(&mut self) {
        self.orchestrator.shutdown(&mut self.registry);
    }

    /// Tear down and hand the orchestrator back
    pub fn shutdown(mut self) -> FallbackOrchestrator<E, P, S> {
        self.close();
        self.orchestrator
    }

    fn fallback(&mut self, utterance: &str) -> TurnOutcome {
        for skill in self.registry.ordered() {
            if skill == self.orchestrator.skill_name() && self.orchestrator.handle(utterance) {
                return TurnOutcome::Fallback;
            }
        }
        self.orchestrator
            .speaker_mut()
            .speak_dialog(DialogKey::NoAnswer, seed_from_str(utterance));
        TurnOutcome::Unanswered
    }
}
