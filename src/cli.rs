// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Run a DAG of commands in dependency order, resuming from saved state.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$TASKDAG_CONFIG`, else `Taskdag.toml` in the current
    /// working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where the full DAG capture is read from and written to.
    ///
    /// Default: `<state_dir>/<dag id>.state` from the config.
    #[arg(long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Also write a human-readable JSON snapshot of the final state here.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Resume from the saved capture, skipping tasks that already succeeded.
    #[arg(long)]
    pub rerun: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Also append logs to a daily run log (`taskdag.<date>.log`) in this
    /// directory.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Parse + validate, print the DAG, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
