#![allow(dead_code)]

use std::collections::BTreeMap;

use taskdag::config::{ConfigFile, DagSection, RawConfigFile, TaskConfig};
use taskdag::dag::Dag;
use taskdag::task::Task;

use crate::call_log::CallLog;

/// Builder for a `Dag` of function tasks that report to a shared [`CallLog`].
pub struct DagBuilder {
    dag: Dag,
    log: CallLog,
}

impl DagBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            dag: Dag::new(id),
            log: CallLog::new(),
        }
    }

    /// Task that succeeds after the given dependencies.
    pub fn ok(mut self, id: &str, deps: &[&str]) -> Self {
        let task =
            Task::function(id, self.log.succeed(id)).with_dependencies(deps.iter().copied());
        self.dag.add(task);
        self
    }

    /// Task that fails with `message` after the given dependencies.
    pub fn failing(mut self, id: &str, deps: &[&str], message: &str) -> Self {
        let task =
            Task::function(id, self.log.fail(id, message)).with_dependencies(deps.iter().copied());
        self.dag.add(task);
        self
    }

    /// Add an arbitrary task.
    pub fn task(mut self, task: Task) -> Self {
        self.dag.add(task);
        self
    }

    pub fn build(self) -> (Dag, CallLog) {
        (self.dag, self.log)
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                dag: DagSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.config.dag.id = Some(id.to_string());
        self
    }

    pub fn with_state_dir(mut self, dir: &str) -> Self {
        self.config.dag.state_dir = dir.into();
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// Task running a shell line.
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: Some(cmd.to_string()),
                program: None,
                args: vec![],
                after: vec![],
                cwd: None,
                env: BTreeMap::new(),
                capture_stdout: true,
                output_key: None,
            },
        }
    }

    /// Task running a program directly.
    pub fn program(program: &str, args: &[&str]) -> Self {
        let mut builder = Self::new("");
        builder.task.cmd = None;
        builder.task.program = Some(program.to_string());
        builder.task.args = args.iter().map(|a| a.to_string()).collect();
        builder
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn cwd(mut self, dir: &str) -> Self {
        self.task.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn output_key(mut self, key: &str) -> Self {
        self.task.output_key = Some(key.to_string());
        self
    }

    pub fn capture_stdout(mut self, val: bool) -> Self {
        self.task.capture_stdout = val;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
