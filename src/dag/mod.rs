// src/dag/mod.rs

//! DAG container and persistence.
//!
//! - [`graph`] holds the [`Dag`] itself: tasks keyed by id, aggregate
//!   [`DagState`] and the per-task error map.
//! - [`state_manager`] implements dependency readiness and upstream resets.
//! - [`snapshot`] produces the lossy, human-readable JSON snapshot.
//! - [`capture`] produces the versioned binary capture used to resume runs,
//!   plus the [`TaskRegistry`] that re-attaches closures on restore.

pub mod capture;
pub mod graph;
pub mod snapshot;
pub mod state_manager;

pub use capture::{CAPTURE_FORMAT_VERSION, TaskRegistry};
pub use graph::{Dag, DagState};
pub use snapshot::{DagSnapshot, TaskSnapshot};
