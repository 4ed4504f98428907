//! Subcommand handlers. Each module owns its clap `Args` and a `run_*` entry point.

pub mod browse;
pub mod completions;
pub mod list;
