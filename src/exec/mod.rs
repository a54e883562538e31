// src/exec/mod.rs

//! Execution layer.
//!
//! - [`executor_loop`] owns the [`Executor`] and its scan-and-run loop.
//! - [`report`] defines [`RunOptions`] and the [`RunReport`] a run returns.
//!
//! Task bodies (closures and external commands) live in [`crate::task`].

pub mod executor_loop;
pub mod report;

pub use executor_loop::Executor;
pub use report::{RunOptions, RunReport};
