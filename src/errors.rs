// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Task failures are *not* represented here: those are captured as data on
//! the task (see [`crate::task::TaskError`]). The variants below cover
//! configuration and persistence, which propagate to the caller unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("DAG capture encoding error: {0}")]
    CaptureError(#[from] bincode::Error),

    #[error("Invalid DAG capture: {0}")]
    InvalidCapture(String),

    #[error("Unsupported DAG capture version {found} (this build reads version {supported})")]
    UnsupportedCaptureVersion { found: u32, supported: u32 },
}

pub type Result<T> = std::result::Result<T, TaskdagError>;
