//! Fallbotctl library - exposes the host session for testing

pub mod commands;
pub mod errors;
pub mod output;
pub mod repl;
pub mod session;

pub use session::{Session, TurnOutcome};
