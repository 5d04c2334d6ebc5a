//! Conversation continuation state machine.
//!
//! ```text
//!   Idle --begin chat trigger--> Active      (trigger utterance answered)
//! Active --end chat trigger----> Idle        (trigger utterance answered)
//! Active --end keyword---------> Idle        (utterance consumed, no query)
//! Active --answer ends in '?'--> Active
//! Active --other answer--------> Idle        (includes no answer)
//!   Idle --anything else-------> rejected
//! ```
//!
//! Both heuristics are deliberately plain. Keyword detection is a
//! case-sensitive test against a short list, by default raw substring
//! containment, so "weekend" ends a conversation. `KeywordMatch::Word`
//! restricts it to whole words.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConversationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    #[default]
    Idle,
    Active,
}

/// End keyword matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMatch {
    /// Keyword anywhere in the utterance
    #[default]
    Substring,
    /// Keyword as a whole word
    Word,
}

/// What to do with a continuation-mode utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    /// Not conversing; leave the utterance to the host
    Reject,
    /// An end keyword closed the conversation; the utterance is consumed
    /// without an answer attempt
    EndedByKeyword,
    /// Send the utterance to the brain
    Answer,
}

#[derive(Debug, Clone)]
pub struct ConversationMachine {
    state: ConversationState,
    end_keywords: Vec<String>,
    keyword_match: KeywordMatch,
}

impl ConversationMachine {
    pub fn new(config: &ConversationConfig) -> Self {
        Self {
            state: ConversationState::Idle,
            end_keywords: config.end_keywords.clone(),
            keyword_match: config.keyword_match,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConversationState::Active
    }

    /// Begin chat trigger
    pub fn start(&mut self) {
        self.transition(ConversationState::Active, "begin chat trigger");
    }

    /// End chat trigger, stop, reset and shutdown
    pub fn end(&mut self, reason: &str) {
        self.transition(ConversationState::Idle, reason);
    }

    /// Decide a continuation turn. Ends the conversation on an end keyword.
    pub fn decide(&mut self, utterance: &str) -> TurnDecision {
        if !self.is_active() {
            return TurnDecision::Reject;
        }
        if self.contains_end_keyword(utterance) {
            self.transition(ConversationState::Idle, "end keyword");
            return TurnDecision::EndedByKeyword;
        }
        TurnDecision::Answer
    }

    /// The brain holds the floor only while it keeps asking questions
    pub fn record_answer(&mut self, asked_question: bool) {
        if asked_question {
            self.transition(ConversationState::Active, "answer asked a question");
        } else {
            self.transition(ConversationState::Idle, "answer was not a question");
        }
    }

    pub fn contains_end_keyword(&self, utterance: &str) -> bool {
        self.end_keywords.iter().any(|keyword| match self.keyword_match {
            KeywordMatch::Substring => utterance.contains(keyword.as_str()),
            KeywordMatch::Word => utterance
                .split(|c: char| !c.is_alphanumeric() && c != '\'')
                .any(|word| word == keyword),
        })
    }

    fn transition(&mut self, next: ConversationState, reason: &str) {
        if self.state != next {
            debug!("Conversation {:?} -> {:?} ({})", self.state, next, reason);
        }
        self.state = next;
    }
}

/// An answer that ends in a question mark expects a reply
pub fn is_question(answer: &str) -> bool {
    answer.ends_with('?')
}
