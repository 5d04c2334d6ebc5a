//! Fixed dialog lines spoken by the skill itself.
//!
//! Uses deterministic variety: the same seed always picks the same line.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKey {
    /// Memory wiped and rebuilt
    ResetMemory,
    /// Memory reset could not complete
    ResetFailed,
    /// Host fallback chain found nobody to answer
    NoAnswer,
}

impl DialogKey {
    pub fn key(&self) -> &'static str {
        match self {
            DialogKey::ResetMemory => "reset.memory",
            DialogKey::ResetFailed => "reset.failed",
            DialogKey::NoAnswer => "no.answer",
        }
    }

    fn lines(&self) -> &'static [&'static str] {
        match self {
            DialogKey::ResetMemory => &[
                "I have reset my memory.",
                "My memory is wiped. I only know the basics now.",
                "Done. Everything I learned is forgotten.",
            ],
            DialogKey::ResetFailed => &[
                "I could not reset my memory.",
                "Something went wrong while resetting my memory.",
            ],
            DialogKey::NoAnswer => &[
                "I don't know how to answer that.",
                "Sorry, I have nothing to say about that.",
            ],
        }
    }
}

/// Pick a varied dialogue line based on a seed (for consistency)
fn pick_varied<'a>(options: &[&'a str], seed: u64) -> &'a str {
    if options.is_empty() {
        return "";
    }
    let idx = (seed as usize) % options.len();
    options[idx]
}

/// Generate a hash seed from a string
pub fn seed_from_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

pub fn render(key: DialogKey, seed: u64) -> String {
    pick_varied(key.lines(), seed).to_string()
}
