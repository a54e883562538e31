// src/context.rs

//! Shared execution context.
//!
//! One [`Context`] is threaded by `&mut` through every task of a run. Any
//! task may read earlier entries and write new ones; writes are
//! last-writer-wins and there is no isolation between tasks.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dag::snapshot::write_creating_parent;
use crate::errors::Result;

/// Entries a task body hands back on success. Merged into the context,
/// overwriting existing keys.
pub type ContextUpdate = BTreeMap<String, Value>;

/// Key/value blackboard shared by all tasks in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Convenience for string entries (e.g. captured command output).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a single entry, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Merge a body's update into the context (last writer wins).
    pub fn merge(&mut self, update: ContextUpdate) {
        self.entries.extend(update);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Write the context as pretty JSON. The core never does this on its own;
    /// callers that want a resumable context bundle it next to the DAG capture.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_creating_parent(path.as_ref(), json.as_bytes())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl From<ContextUpdate> for Context {
    fn from(entries: ContextUpdate) -> Self {
        Self { entries }
    }
}
