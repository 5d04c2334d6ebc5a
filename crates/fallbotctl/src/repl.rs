//! REPL - chat with the fallback brain from the terminal

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use fallbot_common::brain::BrainStorage;
use fallbot_common::{MatchingEngine, Speaker};
use owo_colors::OwoColorize;

use crate::session::{Session, TurnOutcome};

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye"];

pub fn print_welcome(skill: &str) {
    println!("{}", format!("fallbotctl chat - {}", skill).bold());
    println!(
        "{}",
        "Say \"begin chat\" to start a conversation, \"quit\" to leave.".dimmed()
    );
    println!();
}

fn print_prompt() {
    print!("{} ", "you>".bright_green());
    let _ = io::stdout().flush();
}

/// Read lines until EOF or an exit word, one turn per line
///
/// The lock is only held while a turn runs, so a signal handler can take
/// the session for shutdown while this loop waits on input.
pub fn run_repl<E, P, S, R>(session: &Mutex<Session<E, P, S>>, input: R, prompt: bool) -> Result<usize>
where
    E: MatchingEngine,
    P: Speaker,
    S: BrainStorage,
    R: BufRead,
{
    let mut turns = 0;
    let mut lines = input.lines();
    loop {
        if prompt {
            print_prompt();
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        let mut guard = session
            .lock()
            .map_err(|_| anyhow!("session lock poisoned"))?;
        let outcome = guard.turn(line);
        tracing::debug!("turn {} -> {:?}", turns, outcome);
        if let TurnOutcome::Triggered { handled: false, .. } = outcome {
            if !guard.orchestrator().is_available() {
                crate::output::display_error("brain unavailable, try \"reset your memory\" again");
            }
        }
        turns += 1;
    }
    Ok(turns)
}
