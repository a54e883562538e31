// src/render.rs

//! Human-readable status overview of a DAG.

use colored::{ColoredString, Colorize};

use crate::dag::{Dag, DagState};
use crate::task::TaskState;

/// Multi-line, color-annotated report of a DAG and its tasks.
///
/// Read-only: takes the DAG by shared reference. Tasks are listed in id
/// order. Whether escape codes are emitted follows `colored`'s environment
/// handling (`NO_COLOR`, `CLICOLOR_FORCE`).
pub fn render_dag_status(dag: &Dag) -> String {
    let mut lines = Vec::with_capacity(dag.len() + 6);

    lines.push(String::new());
    lines.push("=== DAG STATUS OVERVIEW ===".to_string());
    lines.push(format!("DAG: {}", dag.id()));
    lines.push(format!("Overall DAG State: {}", color_dag_state(dag.state())));
    lines.push(String::new());

    for task in dag.tasks() {
        let deps = if task.dependencies().is_empty() {
            "(none)".to_string()
        } else {
            task.dependencies().join(", ")
        };
        lines.push(format!(
            "  {} -> [{}] | state: {}",
            task.id(),
            deps,
            color_task_state(task.state())
        ));
    }

    lines.push("============================".to_string());
    lines.push(String::new());

    lines.join("\n")
}

fn color_task_state(state: TaskState) -> ColoredString {
    match state {
        TaskState::Pending => state.as_str().yellow(),
        TaskState::Running => state.as_str().blue(),
        TaskState::Success => state.as_str().green(),
        TaskState::Failed => state.as_str().red(),
    }
}

fn color_dag_state(state: DagState) -> ColoredString {
    match state {
        DagState::Pending => state.as_str().yellow(),
        DagState::Running => state.as_str().blue(),
        DagState::Completed => state.as_str().green(),
        DagState::Failed => state.as_str().red(),
    }
}
