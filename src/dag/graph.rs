// src/dag/graph.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::task::Task;

/// Aggregate state of a DAG run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DagState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl DagState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DagState::Pending => "PENDING",
            DagState::Running => "RUNNING",
            DagState::Completed => "COMPLETED",
            DagState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named set of tasks plus aggregate run state and a per-task error map.
///
/// Tasks are keyed by id and iterated in id order. Dependency ids are not
/// checked on insertion: unknown ids simply never become satisfied, and the
/// executor reports them as a stall.
#[derive(Debug, Clone)]
pub struct Dag {
    id: String,
    tasks: BTreeMap<String, Task>,
    state: DagState,
    errors: BTreeMap<String, String>,
}

impl Dag {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: BTreeMap::new(),
            state: DagState::Pending,
            errors: BTreeMap::new(),
        }
    }

    /// Rebuild a DAG from persisted parts.
    pub(crate) fn from_parts(
        id: String,
        tasks: BTreeMap<String, Task>,
        state: DagState,
        errors: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id,
            tasks,
            state,
            errors,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> DagState {
        self.state
    }

    /// Failure descriptions keyed by task id.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Insert a task, replacing any task already registered under that id.
    ///
    /// The replaced instance is dropped along with its state.
    pub fn add(&mut self, task: Task) {
        debug!(dag = %self.id, task = %task.id(), "adding task");
        if let Some(old) = self.tasks.insert(task.id().to_string(), task) {
            warn!(
                dag = %self.id,
                task = %old.id(),
                previous_state = %old.state(),
                "task id already present; replacing previous instance"
            );
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All task ids, sorted.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    /// All tasks, sorted by id.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Tasks that list `id` among their dependencies.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.tasks
            .values()
            .filter(|t| t.dependencies().iter().any(|d| d == id))
            .map(Task::id)
            .collect()
    }

    /// Whether every dependency of `id` is in `Success`.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, id: &str) -> Option<bool> {
        let task = self.tasks.get(id)?;
        Some(ReadOnlyStateManager::new(&self.tasks).deps_satisfied(task))
    }

    /// Dependencies of `id` that are missing or not yet `Success`.
    pub fn unmet_dependencies(&self, id: &str) -> Vec<String> {
        match self.tasks.get(id) {
            Some(task) => ReadOnlyStateManager::new(&self.tasks).unmet_dependencies(task),
            None => Vec::new(),
        }
    }

    /// Force re-execution of `id` and its whole upstream chain.
    ///
    /// Resets the task and every transitive dependency to `Pending`, clearing
    /// results and error entries. Downstream tasks are left alone. Returns the
    /// ids that were reset (empty if `id` is unknown).
    pub fn invalidate(&mut self, id: &str) -> Vec<String> {
        let reset = StateManager::new(&mut self.tasks).mark_task_and_dependencies_pending(id);
        for task_id in &reset {
            self.errors.remove(task_id);
        }
        if !reset.is_empty() && self.state == DagState::Completed {
            self.state = DagState::Pending;
        }
        reset
    }

    pub(crate) fn set_state(&mut self, state: DagState) {
        self.state = state;
    }

    pub(crate) fn record_error(&mut self, task_id: &str, message: String) {
        self.errors.insert(task_id.to_string(), message);
    }

    pub(crate) fn clear_error(&mut self, task_id: &str) -> Option<String> {
        self.errors.remove(task_id)
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DAG {} (state={})>", self.id, self.state)
    }
}
