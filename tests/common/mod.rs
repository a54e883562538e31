#![allow(dead_code)]

pub use taskdag_test_utils::builders;
pub use taskdag_test_utils::call_log::CallLog;
pub use taskdag_test_utils::{init_tracing, with_timeout};

use taskdag::context::Context;
use taskdag::dag::Dag;
use taskdag::exec::{Executor, RunOptions, RunReport};

/// Run `dag` with a fresh context and return both the report and context.
pub async fn run_fresh(dag: &mut Dag) -> (RunReport, Context) {
    let mut ctx = Context::new();
    let report = Executor::new().run(dag, &mut ctx, RunOptions::default()).await;
    (report, ctx)
}
