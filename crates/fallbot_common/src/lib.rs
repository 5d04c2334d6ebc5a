//! Fallbot Common - brain lifecycle and conversation continuation for a
//! pattern-matching fallback skill.
//!
//! When no other intent matches, the host hands the utterance to the
//! [`FallbackOrchestrator`], which asks the brain, speaks the answer and
//! keeps the conversation going while the brain keeps asking questions.

pub mod brain;
pub mod config;
pub mod conversation;
pub mod dialog;
pub mod engine;
pub mod error;
pub mod host;
pub mod identity;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod predicates;
pub mod triggers;

pub use brain::{BootstrapReport, BrainRepository, BrainSource, BrainStorage, CheckpointPolicy, FsStorage};
pub use config::FallbotConfig;
pub use conversation::{ConversationState, KeywordMatch};
pub use engine::{EngineError, MatchingEngine, PatternEngine};
pub use error::{FallbotError, Result};
pub use host::{FallbackRegistry, PriorityRegistry, Speaker};
pub use orchestrator::{AnswerOutcome, ConverseOutcome, FallbackOrchestrator};
pub use triggers::{route_trigger, Trigger};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
