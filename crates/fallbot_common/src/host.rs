//! Host-side collaborators: speech output and the fallback registry.

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::dialog::{self, DialogKey};
use crate::error::Result;

/// Speech/output sink
pub trait Speaker {
    /// Say `text`; `expect_response` asks the host to listen for a reply
    fn speak(&mut self, text: &str, expect_response: bool);

    fn speak_dialog(&mut self, key: DialogKey, seed: u64) {
        self.speak(&dialog::render(key, seed), false);
    }
}

/// Registry of fallback handlers, consulted in priority order
pub trait FallbackRegistry {
    fn register(&mut self, skill: &str, priority: u8) -> Result<()>;

    fn deregister(&mut self, skill: &str);
}

/// In-process registry: lower priority first, ties in registration order
#[derive(Debug, Default)]
pub struct PriorityRegistry {
    handlers: BTreeMap<(u8, u64), String>,
    next_seq: u64,
}

impl PriorityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered skill names, most preferred first
    pub fn ordered(&self) -> Vec<String> {
        self.handlers.values().cloned().collect()
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.handlers.values().any(|s| s == skill)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FallbackRegistry for PriorityRegistry {
    fn register(&mut self, skill: &str, priority: u8) -> Result<()> {
        // re-registering moves the skill to its new priority
        self.deregister(skill);
        self.handlers
            .insert((priority, self.next_seq), skill.to_string());
        self.next_seq += 1;
        info!("Registered fallback {} with priority {}", skill, priority);
        Ok(())
    }

    fn deregister(&mut self, skill: &str) {
        let before = self.handlers.len();
        self.handlers.retain(|_, s| s != skill);
        if self.handlers.len() != before {
            debug!("Deregistered fallback {}", skill);
        }
    }
}
