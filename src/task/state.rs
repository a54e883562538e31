// src/task/state.rs

//! Per-task state machine values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single task.
///
/// `Pending -> Running -> Success | Failed`. Terminal states only go back to
/// `Pending` through an explicit reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Success => "SUCCESS",
            TaskState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome payload of the most recent execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskResult {
    Success,
    /// Human-readable failure description, including the underlying error.
    Failed(String),
}

impl TaskResult {
    /// Failure description, if this is a failure.
    pub fn error(&self) -> Option<&str> {
        match self {
            TaskResult::Success => None,
            TaskResult::Failed(msg) => Some(msg),
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskResult::Success => f.write_str("Success"),
            TaskResult::Failed(msg) => write!(f, "Error: {msg}"),
        }
    }
}
