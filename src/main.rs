// src/main.rs

use std::process::ExitCode;

use taskdag::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("taskdag error: {err:?}");
            ExitCode::from(2)
        }
    }
}

/// Exit 0 when the DAG completed (or on `--dry-run`), 1 when it failed.
async fn run_main() -> anyhow::Result<ExitCode> {
    let args = cli::parse();
    let _log_guard = logging::init_logging(args.log_level, args.log_dir.as_deref())?;
    match run(args).await? {
        Some(report) if !report.is_completed() => Ok(ExitCode::from(1)),
        _ => Ok(ExitCode::SUCCESS),
    }
}
