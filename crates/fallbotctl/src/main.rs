//! Fallbot Control - terminal host for the pattern-matching fallback brain

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fallbot_common::{logging, FallbotConfig, VERSION};
use fallbotctl::errors::{exit_code, EXIT_SUCCESS};
use fallbotctl::{commands, output, repl};
use tracing::info;

#[derive(Parser)]
#[command(name = "fallbotctl")]
#[command(about = "Fallbot - pattern-matching fallback conversation brain", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Config file (default: $FALLBOT_CONFIG, /etc/fallbot, then the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat,

    /// Send one utterance through the host and print the answer
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        utterance: Vec<String>,
    },

    /// Wipe the snapshot and relearn the corpus
    Reset,

    /// Show brain and skill status
    Status,

    /// Print the effective configuration
    Config {
        /// Write a default config file instead
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            output::display_error(&format!("{:#}", e));
            exit_code(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { init: true } = cli.command {
        return commands::config(&FallbotConfig::default(), cli.config.as_deref(), true);
    }

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Chat => chat(config).await,
        Commands::Ask { utterance } => commands::ask(&config, &utterance),
        Commands::Reset => commands::reset(&config),
        Commands::Status => commands::status(&config),
        Commands::Config { init } => commands::config(&config, cli.config.as_deref(), init),
    }
}

/// Run the blocking REPL until EOF or Ctrl-C, then shut the skill down
async fn chat(config: FallbotConfig) -> Result<()> {
    let session = commands::open_session(&config)?;
    repl::print_welcome(session.orchestrator().skill_name());
    let session = Arc::new(Mutex::new(session));

    let repl_session = Arc::clone(&session);
    let repl_task = tokio::task::spawn_blocking(move || {
        repl::run_repl(&repl_session, io::stdin().lock(), true)
    });

    let interrupted = tokio::select! {
        joined = repl_task => {
            let turns = joined.context("REPL task panicked")??;
            info!("Chat ended after {} turns", turns);
            false
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            println!();
            true
        }
    };

    let mut session = session.lock().map_err(|_| anyhow!("session lock poisoned"))?;
    session.close();
    drop(session);

    if interrupted {
        // the REPL thread is parked on stdin and would hold the runtime open
        std::process::exit(EXIT_SUCCESS);
    }
    Ok(())
}
