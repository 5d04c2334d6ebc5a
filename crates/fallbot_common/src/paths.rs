//! Path helpers for Fallbot
//!
//! Citation: [archwiki:XDG_Base_Directory]

use std::path::PathBuf;

/// System-wide config file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/fallbot/config.toml";

/// Environment override for the config file
pub const CONFIG_ENV: &str = "FALLBOT_CONFIG";

/// Snapshot file name inside the brain directory
pub const SNAPSHOT_FILE: &str = "bot_brain.brn";

/// Base data directory
///
/// Priority:
/// 1. $XDG_DATA_HOME/fallbot
/// 2. dirs::data_dir()/fallbot (~/.local/share/fallbot on Linux)
/// 3. ./fallbot (no home directory at all)
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data).join("fallbot");
    }
    dirs::data_dir()
        .map(|d| d.join("fallbot"))
        .unwrap_or_else(|| PathBuf::from("fallbot"))
}

/// Directory holding the pattern source files
pub fn default_corpus_dir() -> PathBuf {
    data_dir().join("aiml")
}

/// Compiled brain snapshot
pub fn default_snapshot_path() -> PathBuf {
    data_dir().join("brain").join(SNAPSHOT_FILE)
}

/// Per-user config file
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("fallbot/config.toml"));
    }
    dirs::config_dir().map(|d| d.join("fallbot/config.toml"))
}

/// Config search order: explicit override, system file, user file
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        candidates.push(user);
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_lives_under_brain_dir() {
        let path = default_snapshot_path();
        assert!(path.ends_with("brain/bot_brain.brn"));
    }

    #[test]
    fn test_corpus_dir_name() {
        assert!(default_corpus_dir().ends_with("aiml"));
    }

    #[test]
    fn test_system_config_always_searched() {
        let candidates = config_candidates();
        assert!(candidates.contains(&PathBuf::from(SYSTEM_CONFIG_PATH)));
    }
}
