#![forbid(unsafe_code)]

mod cmd;
mod output;
mod source;
mod tui;

use anyhow::Context;
use cairn_core::config::{Config, load_config};
use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cairn: keyboard-driven terminal browser for issue boards",
    long_about = None
)]
struct Cli {
    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and config.
    fn output_mode(&self, config: Option<&Config>) -> OutputMode {
        let preferred = config.and_then(|c| c.output.as_deref());
        output::resolve_output_mode(self.format, self.json, preferred)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Browse",
        about = "Browse a listing interactively",
        long_about = "Open the board browser on a listing file or URL.",
        after_help = "EXAMPLES:\n    # Browse a local listing\n    cairn browse boards.json\n\n    # Start on a specific issue\n    cairn browse boards.json --select acme/api#12\n\n    # Fetch the listing and content from a server\n    CAIRN_BASE_URL=https://issues.example.com cairn browse https://issues.example.com/boards.json"
    )]
    Browse(cmd::browse::BrowseArgs),

    #[command(
        next_help_heading = "Read",
        about = "Print a listing",
        long_about = "Print the boards, groups and issues of a listing, optionally filtered.",
        after_help = "EXAMPLES:\n    # Print every board\n    cairn list boards.json\n\n    # Filter one board\n    cairn list boards.json --board Open --filter crash\n\n    # Emit machine-readable output\n    cairn list boards.json --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Print a shell completion script for cairn",
        long_about = "Print a completion script covering cairn's commands, flags and output formats. Redirect it to wherever your shell loads completions from.",
        after_help = "EXAMPLES:\n    # Install bash completions for the current user\n    cairn completions bash > ~/.local/share/bash-completion/completions/cairn\n\n    # Install zsh completions into a directory on $fpath\n    cairn completions zsh > ~/.zfunc/_cairn\n\n    # Load fish completions\n    cairn completions fish > ~/.config/fish/completions/cairn.fish"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Where log records go for this invocation.
enum LogTarget {
    Stderr,
    File(PathBuf),
    /// The TUI owns the terminal and no log file was requested.
    Discard,
}

impl LogTarget {
    fn for_command(command: &Commands) -> Self {
        let file = env::var_os("CAIRN_LOG_FILE").map(PathBuf::from);
        match (command, file) {
            (_, Some(path)) => Self::File(path),
            (Commands::Browse(_), None) => Self::Discard,
            _ => Self::Stderr,
        }
    }
}

fn init_tracing(target: LogTarget) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("CAIRN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cairn=debug,info"
        } else {
            "cairn=info,warn"
        })
    });

    let json = env::var("CAIRN_LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::Discard => {}
        LogTarget::Stderr if json => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        LogTarget::Stderr => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let writer = Mutex::new(file);
            if json {
                registry
                    .with(fmt::layer().json().with_ansi(false).with_writer(writer))
                    .init();
            } else {
                registry
                    .with(fmt::layer().compact().with_ansi(false).with_writer(writer))
                    .init();
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(LogTarget::for_command(&cli.command))?;

    let project_root = env::current_dir()?;

    let (output, command_result) = match cli.command {
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            (
                cli.output_mode(None),
                cmd::completions::run_completions(args.shell, &mut command),
            )
        }
        Commands::Browse(ref args) => match load_config(&project_root) {
            Ok(config) => (
                cli.output_mode(Some(&config)),
                cmd::browse::run_browse(args, &config),
            ),
            Err(err) => (cli.output_mode(None), Err(err)),
        },
        Commands::List(ref args) => match load_config(&project_root) {
            Ok(config) => {
                let output = cli.output_mode(Some(&config));
                (output, cmd::list::run_list(args, &config, output))
            }
            Err(err) => (cli.output_mode(None), Err(err)),
        },
    };

    if let Err(err) = command_result {
        tracing::debug!(error = %format!("{err:#}"), "command failed");
        output::render_error(output, &output::CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["cairn", "--json", "list", "boards.json"]);
        assert!(cli.json);
        assert!(cli.output_mode(None).is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["cairn", "list", "boards.json", "--json"]);
        assert!(cli.output_mode(None).is_json());
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["cairn", "--format", "text", "list", "boards.json"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn browse_subcommand_parses_selection() {
        let cli = Cli::parse_from(["cairn", "browse", "boards.json", "--select", "#issue-4"]);
        match cli.command {
            Commands::Browse(args) => {
                assert_eq!(args.listing, "boards.json");
                assert_eq!(args.select.as_deref(), Some("#issue-4"));
            }
            other => panic!("expected browse, got {other:?}"),
        }
    }

    #[test]
    fn list_subcommand_parses_filter_and_board() {
        let cli = Cli::parse_from([
            "cairn", "list", "boards.json", "--board", "Open", "--filter", "crash",
        ]);
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.board.as_deref(), Some("Open"));
                assert_eq!(args.filter.as_deref(), Some("crash"));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["cairn", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions(_)));
    }

    #[test]
    fn all_subcommands_listed() {
        let command = Cli::command();
        let names: Vec<&str> = command.get_subcommands().map(clap::Command::get_name).collect();
        for expected in ["browse", "list", "completions"] {
            assert!(names.contains(&expected), "missing subcommand {expected}");
        }
    }

    #[test]
    fn browse_discards_logs_without_log_file() {
        let cli = Cli::parse_from(["cairn", "browse", "boards.json"]);
        if env::var_os("CAIRN_LOG_FILE").is_none() {
            assert!(matches!(
                LogTarget::for_command(&cli.command),
                LogTarget::Discard
            ));
        }
    }
}
