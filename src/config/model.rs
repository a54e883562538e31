// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dag::Dag;
use crate::task::{CommandSpec, StdoutCapture, Task};

/// Fallback DAG id when neither `[dag].id` nor a file name is available.
pub const DEFAULT_DAG_ID: &str = "taskdag";

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [dag]
/// id = "build"
/// state_dir = ".taskdag"
///
/// [task.fetch]
/// cmd = "curl -s https://example.com/data"
///
/// [task.process]
/// program = "./process.sh"
/// args = ["--fast"]
/// after = ["fetch"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub dag: DagSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Build with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub dag: DagSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(dag: DagSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { dag, task }
    }

    pub fn dag_id(&self) -> &str {
        self.dag.id.as_deref().unwrap_or(DEFAULT_DAG_ID)
    }

    /// Default location of the full capture: `<state_dir>/<dag id>.state`.
    pub fn default_state_path(&self) -> PathBuf {
        self.dag.state_dir.join(format!("{}.state", self.dag_id()))
    }

    /// Turn every `[task.<id>]` into a command task.
    ///
    /// Commands run in `root` (normally the config file's directory); a
    /// relative `cwd` is taken from there.
    pub fn build_dag(&self, root: &Path) -> Dag {
        let mut dag = Dag::new(self.dag_id());
        for (id, tc) in self.task.iter() {
            let workdir = match tc.cwd {
                Some(ref cwd) => root.join(cwd),
                None => root.to_path_buf(),
            };
            let spec = tc.command_spec().current_dir(workdir);
            let task =
                Task::command(id.clone(), spec).with_dependencies(tc.after.iter().cloned());
            dag.add(task);
        }
        dag
    }
}

/// `[dag]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DagSection {
    /// DAG id. The loader falls back to the config file stem.
    #[serde(default)]
    pub id: Option<String>,

    /// Directory for the full capture and the context sidecar.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".taskdag")
}

impl Default for DagSection {
    fn default() -> Self {
        Self {
            id: None,
            state_dir: default_state_dir(),
        }
    }
}

/// `[task.<id>]` section.
///
/// Exactly one of `cmd` (a shell line) or `program` (run directly with
/// `args`) must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell line, run through `sh -c`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Program to run directly.
    #[serde(default)]
    pub program: Option<String>,

    /// Arguments for `program`.
    #[serde(default)]
    pub args: Vec<String>,

    /// Dependency list: this task waits for every task listed here.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Store stdout in the context on success.
    #[serde(default = "default_capture_stdout")]
    pub capture_stdout: bool,

    /// Context key for captured stdout; defaults to the task id.
    #[serde(default)]
    pub output_key: Option<String>,
}

fn default_capture_stdout() -> bool {
    true
}

impl TaskConfig {
    /// Build the command this task runs. Assumes a validated config.
    pub fn command_spec(&self) -> CommandSpec {
        let spec = match (&self.cmd, &self.program) {
            (Some(line), _) => CommandSpec::shell(line.clone()),
            (None, Some(program)) => {
                CommandSpec::new(program.clone()).args(self.args.iter().cloned())
            }
            (None, None) => CommandSpec::shell(String::new()),
        };

        let spec = self
            .env
            .iter()
            .fold(spec, |spec, (k, v)| spec.env(k.clone(), v.clone()));

        let spec = match self.cwd {
            Some(ref cwd) => spec.current_dir(cwd.clone()),
            None => spec,
        };

        spec.capture(self.capture())
    }

    fn capture(&self) -> StdoutCapture {
        match (self.capture_stdout, &self.output_key) {
            (false, _) => StdoutCapture::Discard,
            (true, Some(key)) => StdoutCapture::Key(key.clone()),
            (true, None) => StdoutCapture::TaskId,
        }
    }

    /// Display form of the command for dry-run output.
    pub fn describe(&self) -> String {
        match (&self.cmd, &self.program) {
            (Some(line), _) => line.clone(),
            (None, Some(_)) => self.command_spec().command_line(),
            (None, None) => String::new(),
        }
    }
}
