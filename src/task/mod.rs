// src/task/mod.rs

//! Tasks: identity, dependencies and the per-task state machine.
//!
//! - [`state`] holds [`TaskState`] and [`TaskResult`].
//! - [`body`] holds the closed set of task kinds ([`TaskBody`]) and
//!   [`TaskError`].
//! - [`command`] implements the external-program kind.

pub mod body;
pub mod command;
pub mod state;

pub use body::{FunctionBody, TaskBody, TaskError, TaskFn};
pub use command::{CommandSpec, StdoutCapture};
pub use state::{TaskResult, TaskState};

use tracing::{error, info};

use crate::context::{Context, ContextUpdate};

/// A single unit of work in a DAG.
///
/// The id is fixed at construction. `state` only moves through
/// [`Task::execute`] (and back to `Pending` through [`Task::reset`]).
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    dependencies: Vec<String>,
    state: TaskState,
    result: Option<TaskResult>,
    body: TaskBody,
}

impl Task {
    pub fn new(id: impl Into<String>, body: impl Into<TaskBody>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            state: TaskState::Pending,
            result: None,
            body: body.into(),
        }
    }

    /// Task backed by an in-process closure.
    pub fn function<F>(id: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + 'static,
    {
        Self::new(id, TaskBody::function(f))
    }

    /// Task backed by an external program.
    pub fn command(id: impl Into<String>, spec: CommandSpec) -> Self {
        Self::new(id, TaskBody::Command(spec))
    }

    /// Append one dependency. Duplicates are kept as declared.
    pub fn after(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Rebuild a task from persisted parts.
    pub(crate) fn from_parts(
        id: String,
        dependencies: Vec<String>,
        state: TaskState,
        result: Option<TaskResult>,
        body: TaskBody,
    ) -> Self {
        Self {
            id,
            dependencies,
            state,
            result,
            body,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn result(&self) -> Option<&TaskResult> {
        self.result.as_ref()
    }

    pub fn body(&self) -> &TaskBody {
        &self.body
    }

    /// Replace the body, e.g. to re-attach a closure after a restore.
    pub fn attach_body(&mut self, body: impl Into<TaskBody>) {
        self.body = body.into();
    }

    /// Run the body against `ctx`.
    ///
    /// Dependency checking is the executor's job; this runs unconditionally,
    /// even if the task is already terminal. On success the returned entries
    /// are merged into `ctx`. On failure `ctx` keeps whatever the body wrote
    /// before failing.
    pub async fn execute(&mut self, ctx: &mut Context) {
        info!(
            task = %self.id,
            kind = self.body.kind(),
            state = %self.state,
            "task starting"
        );
        self.state = TaskState::Running;

        let outcome = self.body.invoke(&self.id, ctx).await;
        match outcome {
            Ok(update) => {
                ctx.merge(update);
                self.state = TaskState::Success;
                self.result = Some(TaskResult::Success);
                info!(task = %self.id, "task completed successfully");
            }
            Err(err) => {
                let message = err.to_string();
                error!(task = %self.id, error = %message, "task failed");
                self.state = TaskState::Failed;
                self.result = Some(TaskResult::Failed(message));
            }
        }
    }

    /// Put the task back to `Pending` and forget the last result.
    pub fn reset(&mut self) {
        self.state = TaskState::Pending;
        self.result = None;
    }
}
