//! Matching engine boundary.
//!
//! The brain repository and orchestrator drive any engine through
//! [`MatchingEngine`]. [`PatternEngine`] is the bundled implementation, an
//! AIML subset with JSON snapshots.

pub mod aiml;
pub mod pattern;
pub mod template;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::predicates::Predicate;

pub use pattern::PatternEngine;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed pattern file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("cannot write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt snapshot {path}: {reason}")]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("engine state could not be cleared: {0}")]
    Reset(String),
}

/// Pattern matcher the brain is built on
///
/// `respond` returns an empty string when nothing matches; that is a normal
/// outcome, not an error.
pub trait MatchingEngine {
    /// Ingest one pattern-definition file
    fn learn(&mut self, source: &Path) -> Result<(), EngineError>;

    /// Replace the current state with a saved snapshot
    fn load_snapshot(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Persist the current state
    fn save_snapshot(&mut self, path: &Path) -> Result<(), EngineError>;

    /// Forget every learned pattern and predicate
    fn reset_state(&mut self) -> Result<(), EngineError>;

    fn set_predicate(&mut self, predicate: Predicate, value: &str);

    fn respond(&mut self, utterance: &str) -> String;

    /// Number of learned stimulus/response rules
    fn category_count(&self) -> usize;
}
