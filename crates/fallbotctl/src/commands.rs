//! Subcommand implementations

use std::path::Path;

use anyhow::{Context, Result};
use fallbot_common::brain::{BrainRepository, FsStorage};
use fallbot_common::identity::{ConfiguredIdentity, IdentitySource};
use fallbot_common::{paths, FallbackOrchestrator, FallbotConfig, PatternEngine};
use tracing::info;

use crate::output::{self, TerminalSpeaker};
use crate::session::{Session, TurnOutcome};

pub type TerminalSession = Session<PatternEngine, TerminalSpeaker, FsStorage>;

/// Load config from an explicit path or the usual candidates
pub fn load_config(path: Option<&Path>) -> Result<FallbotConfig> {
    match path {
        Some(path) => FallbotConfig::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(FallbotConfig::load()),
    }
}

/// Bootstrap the brain and register it with a fresh host session
pub fn open_session(config: &FallbotConfig) -> Result<TerminalSession> {
    let identity = ConfiguredIdentity::new(&config.identity);
    let speaker = TerminalSpeaker::stdout(&identity.identity().name);
    let brain = BrainRepository::new(
        PatternEngine::new(),
        FsStorage,
        &config.brain,
        Box::new(identity),
        config.identity.clone(),
    );
    let orchestrator =
        FallbackOrchestrator::new(brain, speaker, config).context("bootstrapping the brain")?;
    let session = Session::new(orchestrator, config.triggers.clone())?;
    info!("Session open for {}", session.orchestrator().skill_name());
    Ok(session)
}

pub fn ask(config: &FallbotConfig, words: &[String]) -> Result<()> {
    let utterance = words.join(" ");
    let mut session = open_session(config)?;
    let outcome = session.ask(&utterance)?;
    session.shutdown();
    if outcome == TurnOutcome::Unanswered {
        info!("No answer for {:?}", utterance);
    }
    Ok(())
}

pub fn reset(config: &FallbotConfig) -> Result<()> {
    let mut session = open_session(config)?;
    let result = session.reset();
    session.shutdown();
    result.context("resetting memory")?;
    output::display_success("Memory reset, brain rebuilt from the corpus");
    Ok(())
}

pub fn status(config: &FallbotConfig) -> Result<()> {
    let session = open_session(config)?;
    output::display_status(&session.orchestrator().status());
    session.shutdown();
    Ok(())
}

/// Print the effective config, or write the defaults with `init`
pub fn config(config: &FallbotConfig, path: Option<&Path>, init: bool) -> Result<()> {
    if init {
        let target = path
            .map(Path::to_path_buf)
            .or_else(paths::user_config_path)
            .context("no config directory for this user, pass --config")?;
        if target.exists() {
            anyhow::bail!("{} already exists", target.display());
        }
        FallbotConfig::save_default(&target)?;
        output::display_success(&format!("Wrote default config to {}", target.display()));
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("rendering config")?;
    print!("{}", rendered);
    Ok(())
}
