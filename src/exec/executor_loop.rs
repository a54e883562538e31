// src/exec/executor_loop.rs

//! The scan-and-run loop.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::dag::{Dag, DagState};
use crate::errors::{Result, TaskdagError};
use crate::exec::report::{RunOptions, RunReport};
use crate::render::render_dag_status;
use crate::task::{Task, TaskState};

/// Drives a DAG to completion, one task at a time.
///
/// Each pass walks the still-unresolved tasks in id order and executes every
/// task whose dependencies are all `Success`. A task that becomes ready during
/// a pass (because an earlier task in the same pass just succeeded) runs in
/// that same pass. Passes repeat until nothing is left or a pass executes
/// nothing, which is reported as a stall.
///
/// Failures never abort the loop: independent branches keep running, and only
/// the descendants of a failed task are left `Pending`.
#[derive(Debug, Clone, Default)]
pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    /// Run `dag` against `ctx`.
    ///
    /// Each task executes at most once per call, failure included; there is no
    /// automatic retry. With `options.rerun`, tasks already in `Success` are
    /// skipped.
    pub async fn run(&self, dag: &mut Dag, ctx: &mut Context, options: RunOptions) -> RunReport {
        info!(
            dag = %dag.id(),
            tasks = dag.len(),
            rerun = options.rerun,
            "starting execution of DAG"
        );

        dag.set_state(DagState::Running);

        let mut remaining: BTreeSet<String> = dag.task_ids().map(str::to_string).collect();
        let mut report = RunReport::default();

        while !remaining.is_empty() {
            report.passes += 1;
            let mut made_progress = false;

            // Iterate a copy; `remaining` shrinks as tasks resolve.
            let pass: Vec<String> = remaining.iter().cloned().collect();

            for task_id in pass {
                let Some(state) = dag.get(&task_id).map(Task::state) else {
                    remaining.remove(&task_id);
                    continue;
                };

                if options.rerun && state == TaskState::Success {
                    debug!(task = %task_id, "already succeeded; skipping on rerun");
                    remaining.remove(&task_id);
                    report.skipped.push(task_id);
                    continue;
                }

                if !dag.deps_satisfied(&task_id).unwrap_or(false) {
                    debug!(
                        task = %task_id,
                        pass = report.passes,
                        "dependencies not yet satisfied"
                    );
                    continue;
                }

                self.execute_one(dag, &task_id, ctx).await;

                remaining.remove(&task_id);
                report.executed.push(task_id);
                made_progress = true;
            }

            if !made_progress && !remaining.is_empty() {
                let stuck: Vec<String> = remaining.iter().cloned().collect();
                for task_id in &stuck {
                    debug!(
                        task = %task_id,
                        blocked_by = ?dag.unmet_dependencies(task_id),
                        "task can never become ready"
                    );
                }
                error!(
                    dag = %dag.id(),
                    remaining = ?stuck,
                    "no progress made for DAG; remaining tasks are orphaned"
                );
                dag.set_state(DagState::Failed);
                report.stalled = stuck;
                break;
            }
        }

        if dag.state() != DagState::Failed {
            dag.set_state(DagState::Completed);
            info!(dag = %dag.id(), "DAG execution completed successfully");
        } else {
            warn!(
                dag = %dag.id(),
                failed = dag.errors().len(),
                stalled = report.stalled.len(),
                "DAG ended in FAILED state"
            );
        }

        report.state = dag.state();
        report.rendered = render_dag_status(dag);
        report
    }

    /// Force `task_id` and its upstream chain to run again on the next call
    /// to [`Executor::run`]. Never invoked by the loop itself.
    ///
    /// Unlike [`Dag::invalidate`], an unknown root is an error.
    pub fn invalidate(&self, dag: &mut Dag, task_id: &str) -> Result<Vec<String>> {
        if !dag.contains(task_id) {
            return Err(TaskdagError::TaskNotFound(task_id.to_string()));
        }
        let reset = dag.invalidate(task_id);
        info!(dag = %dag.id(), task = %task_id, reset = ?reset, "invalidated upstream chain");
        Ok(reset)
    }

    /// Execute one ready task and fold its outcome into the DAG.
    async fn execute_one(&self, dag: &mut Dag, task_id: &str, ctx: &mut Context) {
        let Some(task) = dag.get_mut(task_id) else {
            return;
        };

        task.execute(ctx).await;

        let state = task.state();
        let message = task
            .result()
            .and_then(|r| r.error())
            .unwrap_or_default()
            .to_string();

        match state {
            TaskState::Failed => {
                error!(
                    dag = %dag.id(),
                    task = %task_id,
                    blocked = ?dag.dependents_of(task_id),
                    "task caused DAG to fail"
                );
                dag.record_error(task_id, message);
                dag.set_state(DagState::Failed);
            }
            TaskState::Success => {
                if dag.clear_error(task_id).is_some() {
                    debug!(task = %task_id, "cleared error left by an earlier run");
                }
            }
            TaskState::Pending | TaskState::Running => {}
        }
    }
}
