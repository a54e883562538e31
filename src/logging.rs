// src/logging.rs

//! Logging setup for `taskdag` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `TASKDAG_LOG` environment variable: a bare level ("info", "debug") or
//!    a full directive string ("taskdag::exec=debug,info")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries only the rendered DAG
//! status. With `--log-dir`, the same events are also appended to a run log
//! in that directory (`taskdag.<date>.log`, one file per day) through a
//! non-blocking `tracing-appender` writer.

use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV_VAR: &str = "TASKDAG_LOG";

/// File name prefix of run logs.
pub const LOG_FILE_PREFIX: &str = "taskdag";

/// Daily run logs kept in the log directory; older ones are pruned.
const MAX_LOG_FILES: usize = 30;

/// Keeps the run-log writer alive. Buffered lines are flushed on drop.
#[must_use = "dropping the guard stops the run-log writer"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initialise the global logging subscriber.
///
/// Call once at startup; a second call returns an error. Hold the returned
/// guard until the program exits.
pub fn init_logging(
    cli_level: Option<LogLevel>,
    log_dir: Option<&Path>,
) -> Result<LoggingGuard> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(directive_for(lvl)),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| filter_from_env_value(&s))
            .unwrap_or_else(|| EnvFilter::new("info")),
    };

    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = run_log_writer(dir)?;
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(LoggingGuard { _file: file_guard })
}

/// Non-blocking writer appending to the daily run log in `dir`.
///
/// The directory is created if needed. Lines reach the file from a
/// background thread; dropping the guard flushes them.
pub fn run_log_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("opening run log in {}", dir.display()))?;

    Ok(tracing_appender::non_blocking(appender))
}

fn directive_for(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Interpret a `TASKDAG_LOG` value. Unparseable values yield `None`.
pub fn filter_from_env_value(value: &str) -> Option<EnvFilter> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match parse_level_str(value) {
        Some(level) => Some(EnvFilter::new(level)),
        None => EnvFilter::try_new(value).ok(),
    }
}

fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}
