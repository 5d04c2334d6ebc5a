//! Fallback orchestrator - the skill entry points the host calls.
//!
//! Lifecycle: [`FallbackOrchestrator::new`] bootstraps the brain (a failed
//! bootstrap yields no orchestrator at all), [`initialize`] registers with
//! the host's fallback registry, [`shutdown`] tears down.
//!
//! [`initialize`]: FallbackOrchestrator::initialize
//! [`shutdown`]: FallbackOrchestrator::shutdown

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::brain::{BrainRepository, BrainStatus, BrainStorage, FsStorage};
use crate::config::{FallbotConfig, SkillConfig, TriggerConfig};
use crate::conversation::{is_question, ConversationMachine, ConversationState, TurnDecision};
use crate::dialog::DialogKey;
use crate::engine::MatchingEngine;
use crate::error::Result;
use crate::host::{FallbackRegistry, Speaker};
use crate::triggers::{route_trigger, Trigger};

/// Result of one pass of the answer procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Answered { asked_question: bool },
    NoAnswer,
}

impl AnswerOutcome {
    pub fn handled(&self) -> bool {
        matches!(self, AnswerOutcome::Answered { .. })
    }

    pub fn asked_question(&self) -> bool {
        matches!(self, AnswerOutcome::Answered { asked_question: true })
    }
}

/// Why a continuation turn was or was not taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverseOutcome {
    /// Not conversing and not a begin chat request; the brain was not asked
    Declined,
    /// An end keyword closed the conversation; the brain was not asked
    EndedByKeyword,
    /// Begin chat while idle opened the conversation
    Started { handled: bool },
    /// The brain was asked mid-conversation
    Answered { handled: bool },
}

impl ConverseOutcome {
    pub fn handled(&self) -> bool {
        match self {
            ConverseOutcome::Declined | ConverseOutcome::EndedByKeyword => false,
            ConverseOutcome::Started { handled } | ConverseOutcome::Answered { handled } => *handled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStatus {
    pub skill: String,
    pub priority: u8,
    pub registered: bool,
    pub available: bool,
    pub conversation: ConversationState,
    pub brain: BrainStatus,
}

pub struct FallbackOrchestrator<E, P, S = FsStorage> {
    brain: BrainRepository<E, S>,
    conversation: ConversationMachine,
    speaker: P,
    skill: SkillConfig,
    triggers: TriggerConfig,
    filler_query: String,
    /// False after a failed reset: the brain is in an unknown state
    available: bool,
    registered: bool,
    turns: u64,
}

impl<E: MatchingEngine, P: Speaker, S: BrainStorage> FallbackOrchestrator<E, P, S> {
    /// Bootstrap the brain and build the skill around it
    pub fn new(mut brain: BrainRepository<E, S>, speaker: P, config: &FallbotConfig) -> Result<Self> {
        brain.bootstrap()?;
        Ok(Self {
            brain,
            conversation: ConversationMachine::new(&config.conversation),
            speaker,
            skill: config.skill.clone(),
            triggers: config.triggers.clone(),
            filler_query: config.conversation.filler_query.clone(),
            available: true,
            registered: false,
            turns: 0,
        })
    }

    /// Register as a fallback handler with the host
    pub fn initialize(&mut self, registry: &mut dyn FallbackRegistry) -> Result<()> {
        registry.register(&self.skill.name, self.skill.priority)?;
        self.registered = true;
        Ok(())
    }

    /// Cold fallback: answer once, no conversation bookkeeping
    pub fn handle(&mut self, utterance: &str) -> bool {
        if !self.available {
            warn!("{} is unavailable, declining {:?}", self.skill.name, utterance);
            return false;
        }
        self.answer(utterance).handled()
    }

    /// Continuation hook, called by the host before intent matching
    pub fn converse(&mut self, utterances: &[String], lang: &str) -> bool {
        self.converse_turn(utterances, lang).handled()
    }

    /// Continuation hook reporting why the turn was or was not taken
    ///
    /// Only the first utterance is considered. While idle, only a begin chat
    /// request is taken; anything else is declined without querying the brain.
    pub fn converse_turn(&mut self, utterances: &[String], lang: &str) -> ConverseOutcome {
        if !self.available {
            return ConverseOutcome::Declined;
        }
        let Some(utterance) = utterances.first() else {
            return ConverseOutcome::Declined;
        };
        debug!("converse({:?}, {})", utterance, lang);

        match self.conversation.decide(utterance) {
            TurnDecision::Reject => {
                if route_trigger(utterance, &self.triggers) == Trigger::BeginChat {
                    ConverseOutcome::Started {
                        handled: self.start_conversation(utterance),
                    }
                } else {
                    ConverseOutcome::Declined
                }
            }
            TurnDecision::EndedByKeyword => ConverseOutcome::EndedByKeyword,
            TurnDecision::Answer => {
                let outcome = self.answer(utterance);
                self.conversation.record_answer(outcome.asked_question());
                ConverseOutcome::Answered {
                    handled: outcome.handled(),
                }
            }
        }
    }

    /// "Begin chat" trigger; an unavailable skill stays idle
    pub fn start_conversation(&mut self, utterance: &str) -> bool {
        if !self.available {
            warn!("{} is unavailable, not starting a conversation", self.skill.name);
            return false;
        }
        self.conversation.start();
        self.handle(utterance)
    }

    /// "End chat" trigger
    pub fn end_conversation(&mut self, utterance: &str) -> bool {
        self.conversation.end("end chat trigger");
        self.handle(utterance)
    }

    /// Host "stop": drop out of conversation mode
    pub fn stop(&mut self) {
        self.conversation.end("stop");
    }

    /// Wipe learned state, delete the snapshot and relearn the corpus
    ///
    /// On failure the skill stops answering until a later reset succeeds.
    pub fn reset_memory(&mut self) -> Result<()> {
        self.conversation.end("memory reset");
        self.turns += 1;
        match self.brain.reset() {
            Ok(report) => {
                info!("Memory reset, brain rebuilt with {} categories", report.categories);
                self.available = true;
                self.speaker.speak_dialog(DialogKey::ResetMemory, self.turns);
                Ok(())
            }
            Err(e) => {
                error!("Memory reset failed: {}", e);
                self.available = false;
                self.speaker.speak_dialog(DialogKey::ResetFailed, self.turns);
                Err(e)
            }
        }
    }

    /// Teardown; never fails
    pub fn shutdown(&mut self, registry: &mut dyn FallbackRegistry) {
        self.conversation.end("shutdown");
        if let Err(e) = self.brain.clear() {
            warn!("Engine state not cleared on shutdown: {}", e);
        }
        registry.deregister(&self.skill.name);
        self.registered = false;
        info!("{} shut down", self.skill.name);
    }

    pub fn is_active(&self) -> bool {
        self.conversation.is_active()
    }

    pub fn state(&self) -> ConversationState {
        self.conversation.state()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn skill_name(&self) -> &str {
        &self.skill.name
    }

    pub fn lang(&self) -> &str {
        &self.skill.lang
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            skill: self.skill.name.clone(),
            priority: self.skill.priority,
            registered: self.registered,
            available: self.available,
            conversation: self.conversation.state(),
            brain: self.brain.status(),
        }
    }

    pub fn brain(&self) -> &BrainRepository<E, S> {
        &self.brain
    }

    pub fn brain_mut(&mut self) -> &mut BrainRepository<E, S> {
        &mut self.brain
    }

    pub fn speaker(&self) -> &P {
        &self.speaker
    }

    pub fn speaker_mut(&mut self) -> &mut P {
        &mut self.speaker
    }

    /// Query, filler retry mid-conversation, checkpoint, speak
    fn answer(&mut self, utterance: &str) -> AnswerOutcome {
        self.turns += 1;
        let mut response = self.ask_brain(utterance);

        if response.is_empty() && self.conversation.is_active() {
            debug!("No answer mid-conversation, asking for filler");
            let filler = self.filler_query.clone();
            response = self.ask_brain(&filler);
        }

        if response.is_empty() {
            // nothing left to keep the conversation going
            self.conversation.end("no answer");
            return AnswerOutcome::NoAnswer;
        }

        let asked_question = is_question(&response);
        self.speaker.speak(&response, asked_question);
        AnswerOutcome::Answered { asked_question }
    }

    fn ask_brain(&mut self, query: &str) -> String {
        let response = self.brain.respond(query);
        self.brain.checkpoint();
        response
    }
}
