//! CLI argument parsing for baton.

use baton_config::OutputMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[command(name = "baton")]
#[command(about = "Live terminal progress view for AI agent event streams")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Task label shown in the status line (defaults to the command name)
    #[arg(short, long)]
    pub label: Option<String>,

    /// Read events from a file instead of stdin
    #[arg(short, long, value_name = "FILE", conflicts_with = "command")]
    pub input: Option<PathBuf>,

    /// Do not echo streamed assistant text
    #[arg(long)]
    pub no_stream: bool,

    /// Always print a flat log, even on a terminal
    #[arg(long, conflicts_with = "interactive")]
    pub plain: bool,

    /// Always redraw the status line in place, even when not on a terminal
    #[arg(long)]
    pub interactive: bool,

    /// Agent command to run; each line of its stdout is read as an event
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Output mode requested on the command line, if any.
    pub fn output_override(&self) -> Option<OutputMode> {
        if self.plain {
            Some(OutputMode::Plain)
        } else if self.interactive {
            Some(OutputMode::Interactive)
        } else {
            None
        }
    }

    /// `--no-stream` as a config override.
    pub fn stream_override(&self) -> Option<bool> {
        self.no_stream.then_some(false)
    }

    /// The label for this run: explicit, else the command's program name, else `agent`.
    pub fn run_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        self.command
            .first()
            .map(|program| program.rsplit('/').next().unwrap_or(program).to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "agent".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_command() {
        let cli = Cli::parse_from(["baton", "--label", "fix", "--", "codex", "exec", "--json", "hi"]);
        assert_eq!(cli.command, vec!["codex", "exec", "--json", "hi"]);
        assert_eq!(cli.run_label(), "fix");
    }

    #[test]
    fn test_label_defaults_to_program_name() {
        let cli = Cli::parse_from(["baton", "--", "/usr/local/bin/claude", "-p", "task"]);
        assert_eq!(cli.run_label(), "claude");
        let cli = Cli::parse_from(["baton"]);
        assert_eq!(cli.run_label(), "agent");
    }

    #[test]
    fn test_output_and_stream_overrides() {
        let cli = Cli::parse_from(["baton", "--plain", "--no-stream"]);
        assert_eq!(cli.output_override(), Some(OutputMode::Plain));
        assert_eq!(cli.stream_override(), Some(false));

        let cli = Cli::parse_from(["baton"]);
        assert_eq!(cli.output_override(), None);
        assert_eq!(cli.stream_override(), None);
    }

    #[test]
    fn test_plain_and_interactive_conflict() {
        assert!(Cli::try_parse_from(["baton", "--plain", "--interactive"]).is_err());
    }
}
