// src/exec/report.rs

//! Options and results for a single executor run.

use crate::dag::DagState;

/// Knobs for [`crate::exec::Executor::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip tasks that are already `Success` instead of running them again.
    pub rerun: bool,
}

impl RunOptions {
    pub fn rerun() -> Self {
        Self { rerun: true }
    }
}

/// What happened during one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Final DAG state; never `Running`.
    pub state: DagState,
    /// Ids whose body was invoked, in execution order.
    pub executed: Vec<String>,
    /// Ids skipped because they were already `Success` (rerun only).
    pub skipped: Vec<String>,
    /// Ids left unresolved when the run stalled.
    pub stalled: Vec<String>,
    /// Number of scan passes over the remaining tasks.
    pub passes: usize,
    /// Rendered status overview of the DAG after the run.
    pub rendered: String,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.state == DagState::Completed
    }

    pub fn is_stalled(&self) -> bool {
        !self.stalled.is_empty()
    }
}
