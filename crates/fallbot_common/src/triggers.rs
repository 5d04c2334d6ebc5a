//! Trigger Router - maps host utterances to the skill's named triggers
//!
//! The host checks these before falling back, the way it would route any
//! other intent: begin chat, end chat, reset memory, stop.

use crate::config::TriggerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Enter conversation mode
    BeginChat,
    /// Leave conversation mode
    EndChat,
    /// Wipe and rebuild the brain ("reset your memory")
    ResetMemory,
    /// Stop whatever is going on
    Stop,
    /// Not a trigger
    None,
}

/// Lowercase and drop sentence punctuation
fn clean(input: &str) -> String {
    input
        .to_lowercase()
        .replace(['?', '!', ',', '.', ';'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_any(words: &[&str], candidates: &[String]) -> bool {
    candidates.iter().any(|c| words.contains(&c.as_str()))
}

fn contains_phrase(cleaned: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| {
        let p = clean(p);
        !p.is_empty() && format!(" {} ", cleaned).contains(&format!(" {} ", p))
    })
}

/// Route natural language input to a trigger
pub fn route_trigger(input: &str, config: &TriggerConfig) -> Trigger {
    let cleaned = clean(input);
    if cleaned.is_empty() {
        return Trigger::None;
    }
    let words: Vec<&str> = cleaned.split(' ').collect();

    // Reset needs both halves: "reset" + "memory"
    if contains_any(&words, &config.reset_words) && contains_any(&words, &config.memory_words) {
        return Trigger::ResetMemory;
    }

    // End before begin: "end chat" must not read as a chat request
    if contains_phrase(&cleaned, &config.end_chat) {
        return Trigger::EndChat;
    }

    if contains_phrase(&cleaned, &config.begin_chat) {
        return Trigger::BeginChat;
    }

    if config.stop.iter().any(|s| clean(s) == cleaned) {
        return Trigger::Stop;
    }

    Trigger::None
}
