//! `cairn completions`: shell completion scripts for the cairn binary.

use anyhow::{Context, Result};
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

/// Arguments for `cairn completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate for (bash, zsh, fish, elvish, powershell).
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    write_completions(shell, command, &mut stdout.lock())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut impl Write) -> Result<()> {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
    out.flush().context("Failed to write completion script")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_command() -> clap::Command {
        clap::Command::new("cairn")
            .subcommand(clap::Command::new("browse"))
            .subcommand(clap::Command::new("list"))
    }

    #[test]
    fn zsh_script_names_binary_and_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Zsh, &mut sample_command(), &mut buf).expect("write");
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("#compdef cairn"));
        assert!(script.contains("browse"));
        assert!(script.contains("list"));
    }

    #[test]
    fn fish_script_targets_cairn() {
        let mut buf = Vec::new();
        write_completions(Shell::Fish, &mut sample_command(), &mut buf).expect("write");
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("complete -c cairn"));
    }
}
