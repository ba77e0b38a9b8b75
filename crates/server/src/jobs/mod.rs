// crates/server/src/jobs/mod.rs
//! Background optimizer runs.
//!
//! Provides:
//! - `JobController` - single-slot owner of the run lifecycle
//! - `JobStatus` - `Idle | Running | Completed | Timeout | Error(message)`
//! - `RunRequest` / `RunAccepted` - the POST /api/run contract

pub mod controller;
pub mod types;

pub use controller::{JobController, RunSettings, RunSnapshot};
pub use types::{JobStatus, RunAccepted, RunId, RunRequest, StartError};
