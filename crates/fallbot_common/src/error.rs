//! Error types for Fallbot.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;

#[derive(Error, Debug)]
pub enum FallbotError {
    #[error("Pattern corpus unavailable at {path}: {reason}")]
    CorpusUnavailable { path: PathBuf, reason: String },

    #[error("Failed to learn {path}: {source}")]
    Learn {
        path: PathBuf,
        #[source]
        source: EngineError,
    },

    #[error("Memory reset failed: {0}")]
    ResetFailed(String),

    #[error("Brain unavailable after a failed reset")]
    Unavailable,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FallbotError {
    pub fn code(&self) -> i32 {
        match self {
            FallbotError::CorpusUnavailable { .. } => -32010,
            FallbotError::Learn { .. } => -32011,
            FallbotError::ResetFailed(_) => -32013,
            FallbotError::Unavailable => -32014,
            FallbotError::Config(_) => -32015,
            FallbotError::Engine(_) => -32016,
            FallbotError::Io(_) => -32006,
            FallbotError::Json(_) => -32700,
            FallbotError::Toml(_) => -32701,
        }
    }

    /// Fatal errors leave no usable brain behind
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FallbotError::CorpusUnavailable { .. }
                | FallbotError::Learn { .. }
                | FallbotError::ResetFailed(_)
                | FallbotError::Unavailable
        )
    }
}

pub type Result<T> = std::result::Result<T, FallbotError>;
