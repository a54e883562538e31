// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TaskdagError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TaskdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.dag, raw.task))
    }
}

/// Structural checks only.
///
/// Unknown dependencies and cycles are deliberately accepted: the executor
/// reports them as a stall at run time. See [`graph_report`] for a
/// non-fatal diagnostic.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_dag_section(cfg)?;
    validate_task_commands(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskdagError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_dag_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ref id) = cfg.dag.id {
        if id.trim().is_empty() {
            return Err(TaskdagError::ConfigError(
                "[dag].id must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if name.trim().is_empty() {
            return Err(TaskdagError::ConfigError(
                "task ids must not be empty".to_string(),
            ));
        }

        match (&task.cmd, &task.program) {
            (Some(_), Some(_)) => {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{}' sets both `cmd` and `program`; pick one",
                    name
                )));
            }
            (None, None) => {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{}' needs either `cmd` or `program`",
                    name
                )));
            }
            (Some(cmd), None) if cmd.trim().is_empty() => {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{}' has an empty `cmd`",
                    name
                )));
            }
            (None, Some(program)) if program.trim().is_empty() => {
                return Err(TaskdagError::ConfigError(format!(
                    "task '{}' has an empty `program`",
                    name
                )));
            }
            _ => {}
        }

        if !task.args.is_empty() && task.cmd.is_some() {
            return Err(TaskdagError::ConfigError(format!(
                "task '{}' sets `args` with `cmd`; `args` only applies to `program`",
                name
            )));
        }
    }
    Ok(())
}

/// Non-fatal dependency diagnostics for a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphReport {
    /// A valid execution order, or `None` if the graph has a cycle.
    pub order: Option<Vec<String>>,
    /// A task on a cycle, when one exists.
    pub cycle_at: Option<String>,
    /// `(task, dependency)` pairs naming tasks that don't exist.
    pub unknown_dependencies: Vec<(String, String)>,
}

impl GraphReport {
    /// Whether a run of this config could complete at all.
    pub fn is_runnable(&self) -> bool {
        self.order.is_some() && self.unknown_dependencies.is_empty()
    }
}

pub fn graph_report(cfg: &ConfigFile) -> GraphReport {
    // Edge direction: dep -> task. For `[task.B] after = ["A"]` we add A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    let mut unknown_dependencies = Vec::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if cfg.task.contains_key(dep) {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            } else {
                unknown_dependencies.push((name.clone(), dep.clone()));
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => GraphReport {
            order: Some(order.into_iter().map(str::to_string).collect()),
            cycle_at: None,
            unknown_dependencies,
        },
        Err(cycle) => GraphReport {
            order: None,
            cycle_at: Some(cycle.node_id().to_string()),
            unknown_dependencies,
        },
    }
}
