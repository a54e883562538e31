// tests/executor_scenarios.rs

mod common;
use crate::common::builders::DagBuilder;
use crate::common::{init_tracing, run_fresh};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::bail;
use serde_json::json;

use taskdag::context::{Context, ContextUpdate};
use taskdag::dag::{Dag, DagState};
use taskdag::errors::TaskdagError;
use taskdag::exec::{Executor, RunOptions};
use taskdag::task::{Task, TaskResult, TaskState};

type BodyResult = anyhow::Result<ContextUpdate>;

fn state_of(dag: &Dag, id: &str) -> TaskState {
    dag.get(id).expect("task should exist").state()
}

/// A (ok) -> B (ok) -> C (fails) -> D
#[tokio::test]
async fn test_chain_failure_leaves_descendant_pending() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("chain")
        .ok("A", &[])
        .ok("B", &["A"])
        .failing("C", &["B"], "boom in C")
        .ok("D", &["C"])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(state_of(&dag, "A"), TaskState::Success);
    assert_eq!(state_of(&dag, "B"), TaskState::Success);
    assert_eq!(state_of(&dag, "C"), TaskState::Failed);
    assert_eq!(state_of(&dag, "D"), TaskState::Pending);
    assert_eq!(dag.state(), DagState::Failed);
    assert_eq!(report.state, DagState::Failed);

    assert_eq!(dag.errors().len(), 1);
    assert!(dag.errors()["C"].contains("boom in C"));

    assert_eq!(log.count_of("D"), 0);
    assert_eq!(log.calls(), vec!["A", "B", "C"]);
    assert_eq!(report.executed, vec!["A", "B", "C"]);
    assert_eq!(report.stalled, vec!["D"]);
}

#[tokio::test]
async fn test_all_success_completes_with_no_errors() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("happy")
        .ok("fetch", &[])
        .ok("parse", &["fetch"])
        .ok("report", &["parse", "fetch"])
        .build();

    let (report, ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.state(), DagState::Completed);
    assert!(report.is_completed());
    assert!(dag.errors().is_empty());
    assert!(!report.is_stalled());
    assert_eq!(log.count(), 3);
    assert!(dag.tasks().all(|t| t.result() == Some(&TaskResult::Success)));
    assert_eq!(ctx.get_str("report"), Some("done"));
}

#[tokio::test]
async fn test_independent_branch_survives_sibling_failure() {
    init_tracing();

    let (mut dag, _log) = DagBuilder::new("branches")
        .failing("lonely", &[], "nobody depends on me")
        .ok("left", &[])
        .ok("right", &["left"])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(state_of(&dag, "lonely"), TaskState::Failed);
    assert_eq!(state_of(&dag, "left"), TaskState::Success);
    assert_eq!(state_of(&dag, "right"), TaskState::Success);
    assert_eq!(dag.state(), DagState::Failed);
    // Everything resolved, so this is a failure, not a stall.
    assert!(report.stalled.is_empty());
}

#[tokio::test]
async fn test_dependencies_declared_out_of_order_still_run() {
    init_tracing();

    // "a_last" sorts before its dependency, so it waits one pass.
    let (mut dag, log) = DagBuilder::new("order")
        .ok("a_last", &["z_first"])
        .ok("z_first", &[])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.state(), DagState::Completed);
    assert_eq!(log.calls(), vec!["z_first", "a_last"]);
    assert_eq!(report.passes, 2);
}

#[tokio::test]
async fn test_task_ready_mid_pass_runs_in_same_pass() {
    init_tracing();

    let (mut dag, _log) = DagBuilder::new("one-pass")
        .ok("a", &[])
        .ok("b", &["a"])
        .ok("c", &["b"])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.state(), DagState::Completed);
    assert_eq!(report.passes, 1);
}

#[tokio::test]
async fn test_missing_dependency_is_reported_as_stall() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("orphans")
        .ok("A", &[])
        .ok("B", &["ghost"])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.state(), DagState::Failed);
    assert_eq!(state_of(&dag, "A"), TaskState::Success);
    assert_eq!(state_of(&dag, "B"), TaskState::Pending);
    assert_eq!(report.stalled, vec!["B"]);
    assert!(dag.errors().is_empty(), "a stall records no task errors");
    assert_eq!(log.count_of("B"), 0);
    assert_eq!(dag.unmet_dependencies("B"), vec!["ghost (missing)"]);
}

#[tokio::test]
async fn test_cycle_is_reported_as_stall() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("cycle")
        .ok("X", &["Y"])
        .ok("Y", &["X"])
        .ok("free", &[])
        .build();

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.state(), DagState::Failed);
    assert_eq!(report.stalled, vec!["X", "Y"]);
    assert_eq!(log.calls(), vec!["free"]);
}

#[tokio::test]
async fn test_rerun_of_completed_dag_executes_nothing() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("idempotent")
        .ok("A", &[])
        .ok("B", &["A"])
        .ok("C", &["B"])
        .build();

    let executor = Executor::new();
    let mut ctx = Context::new();
    executor.run(&mut dag, &mut ctx, RunOptions::default()).await;
    assert_eq!(log.count(), 3);

    let report = executor.run(&mut dag, &mut ctx, RunOptions::rerun()).await;

    assert_eq!(log.count(), 3, "rerun must not execute succeeded tasks");
    assert!(report.executed.is_empty());
    assert_eq!(report.skipped, vec!["A", "B", "C"]);
    assert_eq!(dag.state(), DagState::Completed);
}

#[tokio::test]
async fn test_run_without_rerun_executes_everything_again() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("again").ok("A", &[]).ok("B", &["A"]).build();

    let executor = Executor::new();
    let mut ctx = Context::new();
    executor.run(&mut dag, &mut ctx, RunOptions::default()).await;
    executor.run(&mut dag, &mut ctx, RunOptions::default()).await;

    assert_eq!(log.calls(), vec!["A", "B", "A", "B"]);
    assert_eq!(dag.state(), DagState::Completed);
}

#[tokio::test]
async fn test_rerun_resumes_after_failure_and_clears_error() {
    init_tracing();

    let attempts = Arc::new(AtomicUsize::new(0));
    let flaky_attempts = Arc::clone(&attempts);
    let flaky = Task::function("flaky", move |_ctx: &mut Context| -> BodyResult {
        if flaky_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            bail!("transient failure");
        }
        Ok(ContextUpdate::new())
    })
    .after("setup");

    let (mut dag, log) = DagBuilder::new("resume")
        .ok("setup", &[])
        .task(flaky)
        .ok("publish", &["flaky"])
        .build();

    let executor = Executor::new();
    let mut ctx = Context::new();

    let first = executor.run(&mut dag, &mut ctx, RunOptions::default()).await;
    assert_eq!(first.state, DagState::Failed);
    assert!(dag.errors()["flaky"].contains("transient failure"));
    assert_eq!(state_of(&dag, "publish"), TaskState::Pending);

    let second = executor.run(&mut dag, &mut ctx, RunOptions::rerun()).await;
    assert_eq!(second.state, DagState::Completed);
    assert_eq!(second.skipped, vec!["setup"]);
    assert_eq!(second.executed, vec!["flaky", "publish"]);
    assert!(dag.errors().is_empty());

    assert_eq!(log.count_of("setup"), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_context_flows_between_tasks() {
    init_tracing();

    let producer = Task::function("producer", |_ctx: &mut Context| -> BodyResult {
        let mut update = ContextUpdate::new();
        update.insert("data_from_producer".to_string(), json!(123));
        update.insert("shared".to_string(), json!("producer"));
        Ok(update)
    });

    let consumer = Task::function("consumer", |ctx: &mut Context| -> BodyResult {
        let seen = ctx
            .get("data_from_producer")
            .and_then(|v| v.as_i64())
            .unwrap_or_default();
        // Direct writes are visible just like returned entries.
        ctx.insert("doubled", seen * 2);
        let mut update = ContextUpdate::new();
        update.insert("shared".to_string(), json!("consumer"));
        Ok(update)
    })
    .after("producer");

    let mut dag = Dag::new("blackboard");
    dag.add(producer);
    dag.add(consumer);

    let (report, ctx) = run_fresh(&mut dag).await;

    assert!(report.is_completed());
    assert_eq!(ctx.get("doubled"), Some(&json!(246)));
    assert_eq!(ctx.get_str("shared"), Some("consumer"), "last writer wins");
}

#[tokio::test]
async fn test_failed_task_keeps_partial_context_writes() {
    init_tracing();

    let half_done = Task::function("half", |ctx: &mut Context| -> BodyResult {
        ctx.insert("partial", true);
        bail!("gave up halfway");
    });

    let mut dag = Dag::new("partial");
    dag.add(half_done);

    let (_report, ctx) = run_fresh(&mut dag).await;

    assert_eq!(state_of(&dag, "half"), TaskState::Failed);
    assert_eq!(ctx.get("partial"), Some(&json!(true)));
    match dag.get("half").and_then(|t| t.result()) {
        Some(TaskResult::Failed(msg)) => assert!(msg.contains("gave up halfway")),
        other => panic!("expected failed result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_execute_reruns_terminal_task_unconditionally() {
    init_tracing();

    let log = common::CallLog::new();
    let mut task = Task::function("again", log.succeed("again"));
    let mut ctx = Context::new();

    task.execute(&mut ctx).await;
    assert_eq!(task.state(), TaskState::Success);
    task.execute(&mut ctx).await;

    assert_eq!(task.state(), TaskState::Success);
    assert_eq!(log.count_of("again"), 2);
}

#[tokio::test]
async fn test_re_adding_task_replaces_previous_instance() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("replace")
        .failing("A", &[], "old instance")
        .build();
    dag.add(Task::function("A", log.succeed("A")));

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert_eq!(dag.len(), 1);
    assert!(report.is_completed());
    assert_eq!(log.calls(), vec!["A"]);
}

#[tokio::test]
async fn test_invalidate_resets_only_upstream_chain() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("invalidate")
        .ok("A", &[])
        .ok("B", &["A"])
        .ok("C", &["B"])
        .ok("U", &[])
        .build();

    let executor = Executor::new();
    let mut ctx = Context::new();
    executor.run(&mut dag, &mut ctx, RunOptions::default()).await;
    log.clear();

    let reset = executor.invalidate(&mut dag, "B").unwrap();

    assert_eq!(reset, vec!["B", "A"]);
    assert_eq!(dag.dependents_of("B"), vec!["C"]);
    assert_eq!(state_of(&dag, "A"), TaskState::Pending);
    assert_eq!(state_of(&dag, "B"), TaskState::Pending);
    assert_eq!(state_of(&dag, "C"), TaskState::Success);
    assert_eq!(state_of(&dag, "U"), TaskState::Success);
    assert!(dag.get("A").and_then(|t| t.result()).is_none());
    assert_eq!(dag.state(), DagState::Pending);

    let report = executor.run(&mut dag, &mut ctx, RunOptions::rerun()).await;

    assert_eq!(report.executed, vec!["A", "B"]);
    assert_eq!(log.calls(), vec!["A", "B"]);
    assert_eq!(dag.state(), DagState::Completed);
}

#[tokio::test]
async fn test_invalidate_clears_errors_and_tolerates_cycles() {
    init_tracing();

    let (mut dag, _log) = DagBuilder::new("invalidate-cycle")
        .failing("P", &["Q"], "never reached")
        .ok("Q", &["P"])
        .failing("solo", &[], "solo failed")
        .build();

    run_fresh(&mut dag).await;
    assert!(dag.errors().contains_key("solo"));

    assert_eq!(dag.invalidate("solo"), vec!["solo"]);
    assert!(!dag.errors().contains_key("solo"));

    let mut cyclic = dag.invalidate("P");
    cyclic.sort();
    assert_eq!(cyclic, vec!["P", "Q"]);

    assert!(dag.invalidate("does-not-exist").is_empty());
    assert!(matches!(
        Executor::new().invalidate(&mut dag, "does-not-exist"),
        Err(TaskdagError::TaskNotFound(id)) if id == "does-not-exist"
    ));
}

#[tokio::test]
async fn test_duplicate_dependency_ids_are_kept_and_run_once() {
    init_tracing();

    let (mut dag, log) = DagBuilder::new("dupes").ok("A", &[]).build();
    dag.add(Task::function("B", log.succeed("B")).after("A").after("A"));

    assert_eq!(dag.get("B").unwrap().dependencies(), ["A", "A"]);

    let (report, _ctx) = run_fresh(&mut dag).await;

    assert!(report.is_completed());
    assert_eq!(log.calls(), vec!["A", "B"]);
    assert_eq!(log.count_of("B"), 1);
    assert_eq!(dag.dependents_of("A"), vec!["B"]);
}
