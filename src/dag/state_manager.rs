// src/dag/state_manager.rs

//! Dependency readiness and state resets over a DAG's task map.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::task::{Task, TaskState};

/// Mutating view over the task map, used for explicit resets.
pub struct StateManager<'a> {
    tasks: &'a mut BTreeMap<String, Task>,
}

impl<'a> StateManager<'a> {
    pub fn new(tasks: &'a mut BTreeMap<String, Task>) -> Self {
        Self { tasks }
    }

    /// Reset `root` and everything it transitively depends on to `Pending`.
    ///
    /// Ids that are not in the map are skipped; cycles are cut by the
    /// visited set. Returns the ids that were reset, in visit order.
    pub fn mark_task_and_dependencies_pending(&mut self, root: &str) -> Vec<String> {
        let mut stack: Vec<String> = vec![root.to_string()];
        let mut visited: HashSet<String> = HashSet::new();
        let mut reset = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            let Some(task) = self.tasks.get_mut(&name) else {
                debug!(task = %name, "dependency not in DAG; nothing to reset");
                continue;
            };

            debug!(task = %name, previous_state = %task.state(), "marking task Pending");
            task.reset();
            reset.push(name);
            stack.extend(task.dependencies().iter().cloned());
        }

        reset
    }
}

/// Read-only view for readiness checks.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a BTreeMap<String, Task>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a BTreeMap<String, Task>) -> Self {
        Self { tasks }
    }

    /// A task is ready once every dependency id resolves to a task in
    /// `Success`. A missing dependency is never satisfied.
    pub fn deps_satisfied(&self, task: &Task) -> bool {
        task.dependencies().iter().all(|dep| {
            matches!(
                self.tasks.get(dep).map(Task::state),
                Some(TaskState::Success)
            )
        })
    }

    /// Dependencies holding `task` back, each annotated with why.
    pub fn unmet_dependencies(&self, task: &Task) -> Vec<String> {
        task.dependencies()
            .iter()
            .filter_map(|dep| match self.tasks.get(dep).map(Task::state) {
                Some(TaskState::Success) => None,
                Some(state) => Some(format!("{dep} ({state})")),
                None => Some(format!("{dep} (missing)")),
            })
            .collect()
    }
}
