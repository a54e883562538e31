// src/dag/snapshot.rs

//! Structural, human-readable snapshot of a DAG.
//!
//! The snapshot carries ids, dependencies, states and results, but no task
//! bodies. It is meant for inspection and audit; a DAG cannot be resumed from
//! it. Use the full capture in [`crate::dag::capture`] for that.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dag::graph::{Dag, DagState};
use crate::errors::Result;
use crate::task::{TaskResult, TaskState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub dependencies: Vec<String>,
    pub state: TaskState,
    pub result: Option<TaskResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagSnapshot {
    pub dag_id: String,
    pub dag_state: DagState,
    pub tasks: Vec<TaskSnapshot>,
    pub errors: BTreeMap<String, String>,
}

impl DagSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl Dag {
    pub fn snapshot(&self) -> DagSnapshot {
        DagSnapshot {
            dag_id: self.id().to_string(),
            dag_state: self.state(),
            tasks: self
                .tasks()
                .map(|t| TaskSnapshot {
                    id: t.id().to_string(),
                    dependencies: t.dependencies().to_vec(),
                    state: t.state(),
                    result: t.result().cloned(),
                })
                .collect(),
            errors: self.errors().clone(),
        }
    }

    /// Write the structural snapshot as pretty JSON.
    pub fn write_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!(dag = %self.id(), path = %path.display(), "writing DAG snapshot");
        let json = self.snapshot().to_json()?;
        write_creating_parent(path, json.as_bytes())
    }
}

pub(crate) fn write_creating_parent(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
