// src/task/body.rs

//! The closed set of things a task can do.
//!
//! Every kind is dispatched through [`TaskBody::invoke`], which returns the
//! context entries to merge on success or a [`TaskError`] on failure.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::{Context, ContextUpdate};
use crate::task::command::CommandSpec;

/// Signature of a user-supplied task closure.
///
/// The closure may write to the context directly, return entries to merge,
/// or both.
pub type TaskFn = dyn Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync;

/// Why a task body failed.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0:#}")]
    Function(anyhow::Error),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` returned non-zero exit code: {code}\nStderr: {stderr}")]
    Exit {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("no task body attached for '{0}'")]
    Unbound(String),
}

/// Shared handle to a task closure.
#[derive(Clone)]
pub struct FunctionBody(Arc<TaskFn>);

impl FunctionBody {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    fn call(&self, ctx: &mut Context) -> anyhow::Result<ContextUpdate> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionBody(..)")
    }
}

/// What a task runs when executed.
#[derive(Debug, Clone)]
pub enum TaskBody {
    /// Arbitrary in-process work.
    Function(FunctionBody),
    /// External program, run to completion.
    Command(CommandSpec),
    /// A restored function task whose closure was not re-attached.
    Unbound,
}

impl TaskBody {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + 'static,
    {
        TaskBody::Function(FunctionBody::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TaskBody::Function(_) => "function",
            TaskBody::Command(_) => "command",
            TaskBody::Unbound => "unbound",
        }
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self, TaskBody::Unbound)
    }

    pub async fn invoke(
        &self,
        task_id: &str,
        ctx: &mut Context,
    ) -> Result<ContextUpdate, TaskError> {
        match self {
            TaskBody::Function(body) => body.call(ctx).map_err(TaskError::Function),
            TaskBody::Command(spec) => spec.run(task_id).await,
            TaskBody::Unbound => Err(TaskError::Unbound(task_id.to_string())),
        }
    }
}

impl From<CommandSpec> for TaskBody {
    fn from(spec: CommandSpec) -> Self {
        TaskBody::Command(spec)
    }
}
