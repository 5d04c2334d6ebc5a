//! Configuration management for Fallbot.
//!
//! Loads settings from $FALLBOT_CONFIG, /etc/fallbot/config.toml or the
//! user config file, or uses defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::conversation::KeywordMatch;
use crate::error::{FallbotError, Result};
use crate::paths;

/// Brain storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    /// Directory of pattern source files
    #[serde(default = "paths::default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Compiled brain snapshot
    #[serde(default = "paths::default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Save the snapshot after every Nth query (1 = every query)
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: NonZeroU32,
}

fn default_checkpoint_interval() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir: paths::default_corpus_dir(),
            snapshot_path: paths::default_snapshot_path(),
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

/// Conversation mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Words that end conversation mode when found in an utterance
    #[serde(default = "default_end_keywords")]
    pub end_keywords: Vec<String>,

    /// How end keywords are matched against the utterance
    #[serde(default)]
    pub keyword_match: KeywordMatch,

    /// Query used when the brain has nothing to say mid-conversation
    #[serde(default = "default_filler_query")]
    pub filler_query: String,
}

fn default_end_keywords() -> Vec<String> {
    vec!["end".to_string(), "stop".to_string()]
}

fn default_filler_query() -> String {
    "random pick up line".to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            end_keywords: default_end_keywords(),
            keyword_match: KeywordMatch::default(),
            filler_query: default_filler_query(),
        }
    }
}

/// Registration with the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    #[serde(default = "default_skill_name")]
    pub name: String,

    /// Fallback priority (lower wins)
    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default = "default_lang")]
    pub lang: String,
}

fn default_skill_name() -> String {
    "AimlFallback".to_string()
}

fn default_priority() -> u8 {
    90
}

fn default_lang() -> String {
    "en-us".to_string()
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            name: default_skill_name(),
            priority: default_priority(),
            lang: default_lang(),
        }
    }
}

/// Identity and predicate overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Device name (falls back to $HOSTNAME)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Device type, used as the species predicate
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    #[serde(default = "default_genus")]
    pub genus: String,
    #[serde(default = "default_family")]
    pub family: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_class")]
    pub class: String,
    #[serde(default = "default_kingdom")]
    pub kingdom: String,
    #[serde(default = "default_hometown")]
    pub hometown: String,
    #[serde(default = "default_botmaster")]
    pub botmaster: String,
    #[serde(default = "default_master")]
    pub master: String,
    #[serde(default = "default_age")]
    pub age: String,
}

fn default_genus() -> String {
    "Mycroft".to_string()
}

fn default_family() -> String {
    "virtual personal assistant".to_string()
}

fn default_order() -> String {
    "artificial intelligence".to_string()
}

fn default_class() -> String {
    "computer program".to_string()
}

fn default_kingdom() -> String {
    "machine".to_string()
}

fn default_hometown() -> String {
    "127.0.0.1".to_string()
}

fn default_botmaster() -> String {
    "master".to_string()
}

fn default_master() -> String {
    "the community".to_string()
}

fn default_age() -> String {
    "2".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: None,
            device_type: None,
            genus: default_genus(),
            family: default_family(),
            order: default_order(),
            class: default_class(),
            kingdom: default_kingdom(),
            hometown: default_hometown(),
            botmaster: default_botmaster(),
            master: default_master(),
            age: default_age(),
        }
    }
}

/// Phrases the host routes to the skill's named triggers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "default_begin_chat")]
    pub begin_chat: Vec<String>,

    #[serde(default = "default_end_chat")]
    pub end_chat: Vec<String>,

    #[serde(default = "default_stop")]
    pub stop: Vec<String>,

    /// Reset memory needs one word from each list
    #[serde(default = "default_reset_words")]
    pub reset_words: Vec<String>,

    #[serde(default = "default_memory_words")]
    pub memory_words: Vec<String>,
}

fn default_begin_chat() -> Vec<String> {
    ["begin chat", "let's chat", "lets chat", "chat with me", "talk to me", "start a conversation"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_end_chat() -> Vec<String> {
    ["end chat", "stop chatting", "end conversation", "end the conversation", "stop talking"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stop() -> Vec<String> {
    vec!["stop".to_string(), "shut up".to_string(), "be quiet".to_string()]
}

fn default_reset_words() -> Vec<String> {
    ["reset", "erase", "wipe", "clear", "forget"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_memory_words() -> Vec<String> {
    ["memory", "memories", "brain", "everything"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            begin_chat: default_begin_chat(),
            end_chat: default_end_chat(),
            stop: default_stop(),
            reset_words: default_reset_words(),
            memory_words: default_memory_words(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbotConfig {
    #[serde(default)]
    pub brain: BrainConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub skill: SkillConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub triggers: TriggerConfig,
}

impl FallbotConfig {
    /// Load config from the first readable candidate, or defaults
    pub fn load() -> Self {
        for candidate in paths::config_candidates() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_path(&candidate) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config {}: {}", candidate.display(), e),
            }
        }
        warn!("Config not found, using defaults");
        FallbotConfig::default()
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: FallbotConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save default config to path (for init)
    pub fn save_default(path: &Path) -> Result<()> {
        let config = FallbotConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| FallbotError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.conversation.end_keywords.iter().any(|k| k.is_empty()) {
            // an empty keyword would end every conversation
            return Err(FallbotError::Config(
                "conversation.end_keywords must not contain empty strings".to_string(),
            ));
        }
        if self.conversation.filler_query.trim().is_empty() {
            return Err(FallbotError::Config(
                "conversation.filler_query must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
