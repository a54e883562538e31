// src/task/command.rs

//! External-command task bodies.
//!
//! The process runs to completion before the task finishes: no background
//! execution and no timeout. Exit status 0 means success; stdout can be
//! captured into the context. Any other status is a failure carrying the
//! exit code and captured stderr.

use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::context::ContextUpdate;
use crate::task::body::TaskError;

/// Where a successful command's stdout ends up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StdoutCapture {
    /// Drop stdout.
    Discard,
    /// Store under the owning task's id.
    #[default]
    TaskId,
    /// Store under an explicit key.
    Key(String),
}

impl StdoutCapture {
    fn key_for(&self, task_id: &str) -> Option<String> {
        match self {
            StdoutCapture::Discard => None,
            StdoutCapture::TaskId => Some(task_id.to_string()),
            StdoutCapture::Key(key) => Some(key.clone()),
        }
    }
}

/// A program invocation. Plain data, so it survives a full DAG capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub capture: StdoutCapture,
}

impl CommandSpec {
    /// Run `program` directly with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            capture: StdoutCapture::default(),
        }
    }

    /// Run a line through the platform shell.
    pub fn shell(line: impl Into<String>) -> Self {
        let line = line.into();
        if cfg!(windows) {
            Self::new("cmd").args(["/C".to_string(), line])
        } else {
            Self::new("sh").args(["-c".to_string(), line])
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn capture(mut self, capture: StdoutCapture) -> Self {
        self.capture = capture;
        self
    }

    /// `program arg1 arg2 ...`, for logs and failure messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) async fn run(&self, task_id: &str) -> Result<ContextUpdate, TaskError> {
        let command_line = self.command_line();
        info!(task = %task_id, cmd = %command_line, "starting task process");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd.output().await.map_err(|source| TaskError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);

        info!(
            task = %task_id,
            exit_code = code,
            success = output.status.success(),
            "task process exited"
        );

        if !output.status.success() {
            return Err(TaskError::Exit {
                command: command_line,
                code,
                stderr: stderr.trim_end().to_string(),
            });
        }

        for line in stderr.lines() {
            debug!(task = %task_id, "stderr: {}", line);
        }

        let mut update = ContextUpdate::new();
        if let Some(key) = self.capture.key_for(task_id) {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let captured = stdout.trim_end_matches(['\n', '\r']).to_string();
            debug!(task = %task_id, key = %key, bytes = captured.len(), "captured stdout");
            update.insert(key, Value::String(captured));
        }

        Ok(update)
    }
}
