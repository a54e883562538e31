// src/dag/capture.rs

//! Full, resumable binary capture of a DAG.
//!
//! Layout: the 4-byte magic `TDAG`, a little-endian `u32` format version,
//! then a bincode payload with the DAG's id, state, errors and every task's
//! id, dependencies, state, result and body descriptor.
//!
//! Closures are never serialized. Function tasks are recorded by id and get
//! their body back from a [`TaskRegistry`] at restore time. Command tasks are
//! plain data and come back as-is. The execution context is not part of the
//! capture.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::{Context, ContextUpdate};
use crate::dag::graph::{Dag, DagState};
use crate::dag::snapshot::write_creating_parent;
use crate::errors::{Result, TaskdagError};
use crate::task::{CommandSpec, FunctionBody, Task, TaskBody, TaskResult, TaskState};

const MAGIC: &[u8; 4] = b"TDAG";
const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u32>();

/// Version written by this build and the only one it reads.
pub const CAPTURE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DagRecord {
    id: String,
    state: DagState,
    errors: BTreeMap<String, String>,
    tasks: Vec<TaskRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TaskRecord {
    id: String,
    dependencies: Vec<String>,
    state: TaskState,
    result: Option<TaskResult>,
    body: BodyRecord,
}

#[derive(Debug, Serialize, Deserialize)]
enum BodyRecord {
    /// Re-attached from the registry by task id.
    Function,
    Command(CommandSpec),
}

/// Function bodies keyed by task id, used to re-attach closures on restore.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    bodies: HashMap<String, FunctionBody>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the closure for `task_id`, replacing any earlier one.
    pub fn register<F>(&mut self, task_id: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> anyhow::Result<ContextUpdate> + Send + Sync + 'static,
    {
        self.bodies.insert(task_id.into(), FunctionBody::new(f));
        self
    }

    pub fn insert(&mut self, task_id: impl Into<String>, body: FunctionBody) {
        self.bodies.insert(task_id.into(), body);
    }

    pub fn get(&self, task_id: &str) -> Option<&FunctionBody> {
        self.bodies.get(task_id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Collect the function bodies of a live DAG.
    pub fn from_dag(dag: &Dag) -> Self {
        let bodies = dag
            .tasks()
            .filter_map(|t| match t.body() {
                TaskBody::Function(body) => Some((t.id().to_string(), body.clone())),
                _ => None,
            })
            .collect();
        Self { bodies }
    }
}

impl Dag {
    /// Encode the full capture.
    pub fn serialize_full(&self) -> Result<Vec<u8>> {
        let record = DagRecord {
            id: self.id().to_string(),
            state: self.state(),
            errors: self.errors().clone(),
            tasks: self
                .tasks()
                .map(|t| TaskRecord {
                    id: t.id().to_string(),
                    dependencies: t.dependencies().to_vec(),
                    state: t.state(),
                    result: t.result().cloned(),
                    body: match t.body() {
                        TaskBody::Command(spec) => BodyRecord::Command(spec.clone()),
                        TaskBody::Function(_) | TaskBody::Unbound => BodyRecord::Function,
                    },
                })
                .collect(),
        };

        let payload = bincode::serialize(&record)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&CAPTURE_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode a full capture, re-attaching function bodies from `registry`.
    ///
    /// Function tasks without a registry entry come back as
    /// [`TaskBody::Unbound`]; executing one fails the task.
    pub fn restore_full(bytes: &[u8], registry: &TaskRegistry) -> Result<Dag> {
        if bytes.len() < HEADER_LEN {
            return Err(TaskdagError::InvalidCapture(format!(
                "capture is {} bytes, shorter than the {HEADER_LEN}-byte header",
                bytes.len()
            )));
        }

        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC.as_slice() {
            return Err(TaskdagError::InvalidCapture(
                "missing TDAG magic bytes".to_string(),
            ));
        }

        let (version, payload) = rest.split_at(std::mem::size_of::<u32>());
        let mut version_bytes = [0u8; 4];
        version_bytes.copy_from_slice(version);
        let version = u32::from_le_bytes(version_bytes);
        if version != CAPTURE_FORMAT_VERSION {
            return Err(TaskdagError::UnsupportedCaptureVersion {
                found: version,
                supported: CAPTURE_FORMAT_VERSION,
            });
        }

        let record: DagRecord = bincode::deserialize(payload)?;

        let mut tasks = BTreeMap::new();
        for t in record.tasks {
            let body = match t.body {
                BodyRecord::Command(spec) => TaskBody::Command(spec),
                BodyRecord::Function => match registry.get(&t.id) {
                    Some(body) => TaskBody::Function(body.clone()),
                    None => {
                        warn!(
                            dag = %record.id,
                            task = %t.id,
                            state = %t.state,
                            "no registered body for restored function task"
                        );
                        TaskBody::Unbound
                    }
                },
            };
            let task = Task::from_parts(t.id, t.dependencies, t.state, t.result, body);
            tasks.insert(task.id().to_string(), task);
        }

        Ok(Dag::from_parts(record.id, tasks, record.state, record.errors))
    }

    /// Write the full capture to `path`, creating parent directories.
    pub fn save_full(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!(dag = %self.id(), path = %path.display(), "writing full DAG capture");
        let bytes = self.serialize_full()?;
        write_creating_parent(path, &bytes)
    }

    /// Read a full capture from `path`.
    pub fn load_full(path: impl AsRef<Path>, registry: &TaskRegistry) -> Result<Dag> {
        let path = path.as_ref();
        info!(path = %path.display(), "restoring DAG from full capture");
        let bytes = std::fs::read(path)?;
        let dag = Self::restore_full(&bytes, registry)?;
        info!(dag = %dag.id(), state = %dag.state(), errors = dag.errors().len(), "restored DAG");
        Ok(dag)
    }
}
