//! Terminal output - ASCII only, color when attached to a terminal

use std::io::{self, IsTerminal, Write};

use fallbot_common::brain::BrainStatus;
use fallbot_common::orchestrator::OrchestratorStatus;
use fallbot_common::{ConversationState, Speaker};
use owo_colors::OwoColorize;

/// Speaker that prints the bot's lines
pub struct TerminalSpeaker<W: Write = io::Stdout> {
    out: W,
    color: bool,
    prefix: String,
}

impl TerminalSpeaker<io::Stdout> {
    pub fn stdout(prefix: &str) -> Self {
        let color = io::stdout().is_terminal();
        Self::new(io::stdout(), prefix, color)
    }
}

impl<W: Write> TerminalSpeaker<W> {
    pub fn new(out: W, prefix: &str, color: bool) -> Self {
        Self {
            out,
            color,
            prefix: prefix.to_string(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn format_line(&self, text: &str, expect_response: bool) -> String {
        let marker = if expect_response { " [expects reply]" } else { "" };
        if self.color {
            format!(
                "{} {}{}",
                format!("{}>", self.prefix).bright_cyan(),
                text,
                marker.dimmed()
            )
        } else {
            format!("{}> {}{}", self.prefix, text, marker)
        }
    }
}

impl<W: Write> Speaker for TerminalSpeaker<W> {
    fn speak(&mut self, text: &str, expect_response: bool) {
        let line = self.format_line(text, expect_response);
        // A closed pipe is not worth failing a turn over
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

/// Display an error
pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

/// Display a success message
pub fn display_success(message: &str) {
    println!("[OK] {}", message.green());
}

pub fn display_status(status: &OrchestratorStatus) {
    let brain: &BrainStatus = &status.brain;
    let availability = if status.available {
        "[OK]".bright_green().to_string()
    } else {
        "[UNAVAILABLE]".bright_red().to_string()
    };
    let conversation = match status.conversation {
        ConversationState::Idle => "idle",
        ConversationState::Active => "active",
    };

    println!("{} {} (priority {})", availability, status.skill.bold(), status.priority);
    println!("  conversation:   {}", conversation);
    println!("  corpus:         {}", brain.corpus_dir.display());
    println!(
        "  snapshot:       {} ({})",
        brain.snapshot_path.display(),
        if brain.snapshot_present {
            "present".to_string()
        } else {
            "missing".yellow().to_string()
        }
    );
    println!("  categories:     {}", brain.categories);
    println!(
        "  checkpoint:     every {} queries, {} pending",
        brain.checkpoint_every, brain.queries_since_checkpoint
    );
}
