// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod render;
pub mod task;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, graph_report, load_and_validate};
use crate::context::Context;
use crate::dag::{Dag, TaskRegistry};
use crate::exec::{Executor, RunOptions, RunReport};

pub use crate::context::ContextUpdate;
pub use crate::dag::DagState;
pub use crate::task::{CommandSpec, Task, TaskState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - restoring the saved capture (with `--rerun`)
/// - the executor
/// - persisting the capture, context sidecar and optional snapshot
///
/// Returns the run report, or `None` for `--dry-run`.
pub async fn run(args: CliArgs) -> Result<Option<RunReport>> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    let root = config_root_dir(&config_path);
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| root.join(cfg.default_state_path()));
    let context_path = context_sidecar_path(&state_path);

    let (mut dag, mut ctx, rerun) =
        prepare(&cfg, &root, &state_path, &context_path, args.rerun)?;

    let report = Executor::new()
        .run(&mut dag, &mut ctx, RunOptions { rerun })
        .await;

    println!("{}", report.rendered);

    dag.save_full(&state_path)?;
    ctx.save_json(&context_path)?;
    if let Some(ref snapshot_path) = args.snapshot {
        dag.write_snapshot(snapshot_path)?;
    }

    info!(
        dag = %dag.id(),
        state = %report.state,
        executed = report.executed.len(),
        skipped = report.skipped.len(),
        state_path = %state_path.display(),
        "run finished; state saved"
    );

    Ok(Some(report))
}

/// Build a fresh DAG, or restore the saved one when rerunning.
///
/// Returns the DAG, the context to run with, and whether rerun semantics
/// apply (they don't when there is nothing to resume from).
fn prepare(
    cfg: &ConfigFile,
    root: &Path,
    state_path: &Path,
    context_path: &Path,
    rerun: bool,
) -> Result<(Dag, Context, bool)> {
    if !rerun {
        return Ok((cfg.build_dag(root), Context::new(), false));
    }

    if !state_path.exists() {
        warn!(
            path = %state_path.display(),
            "rerun requested but no saved state found; starting fresh"
        );
        return Ok((cfg.build_dag(root), Context::new(), false));
    }

    // Config tasks are all commands, which the capture carries as data, so
    // there are no closures to re-attach.
    let dag = Dag::load_full(state_path, &TaskRegistry::new())?;
    if dag.id() != cfg.dag_id() {
        warn!(
            restored = %dag.id(),
            configured = %cfg.dag_id(),
            "restored DAG id differs from config"
        );
    }

    let ctx = if context_path.exists() {
        Context::load_json(context_path)?
    } else {
        debug!(path = %context_path.display(), "no saved context; starting empty");
        Context::new()
    };

    Ok((dag, ctx, true))
}

/// Directory relative paths in the config are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "pipelines/Taskdag.toml"),
///   that directory is the root.
/// - If it's a bare filename, the current directory is the root.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// `build.state` -> `build.context.json`, next to the capture.
pub fn context_sidecar_path(state_path: &Path) -> PathBuf {
    state_path.with_extension("context.json")
}

/// Dry-run output: tasks, dependencies, commands and dependency diagnostics.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskdag dry-run");
    println!("  dag.id = {}", cfg.dag_id());
    println!("  dag.state_dir = {}", cfg.dag.state_dir.display());
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.describe());
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(ref cwd) = task.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if !task.env.is_empty() {
            println!("      env: {:?}", task.env.keys().collect::<Vec<_>>());
        }
        if !task.capture_stdout {
            println!("      capture_stdout: false");
        } else if let Some(ref key) = task.output_key {
            println!("      output_key: {key}");
        }
    }
    println!();

    let report = graph_report(cfg);
    for (task, dep) in &report.unknown_dependencies {
        println!("warning: task '{task}' depends on unknown task '{dep}'; it will never run");
    }
    match (&report.order, &report.cycle_at) {
        (Some(order), _) => println!("execution order: {}", order.join(" -> ")),
        (None, Some(node)) => {
            println!("warning: cycle detected involving task '{node}'; a run will stall")
        }
        (None, None) => {}
    }

    debug!("dry-run complete (no execution)");
}
