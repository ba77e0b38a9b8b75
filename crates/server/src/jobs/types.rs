// crates/server/src/jobs/types.rs
//! Types for the optimizer run lifecycle.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monotonically increasing identifier for an accepted run.
pub type RunId = u64;

/// Lifecycle state of the most recent run.
///
/// `Completed`, `Timeout` and `Error` are terminal for a run; only a new
/// `start` moves the status back to `Running`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Timeout,
    Error(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Timeout | Self::Error(_))
    }

    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Timeout => "timeout",
            Self::Error(_) => "error",
        }
    }
}

/// Wire form consumed by dashboards: `Idle`, `Running`, `Completed`,
/// `Timeout`, `Error: <message>`.
impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Running => f.write_str("Running"),
            Self::Completed => f.write_str("Completed"),
            Self::Timeout => f.write_str("Timeout"),
            Self::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Request body for POST /api/run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    /// Required; a missing or blank mode is rejected before anything runs.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub all_subscriptions: bool,
    /// Deadline in seconds; falls back to the configured default (3600).
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl RunRequest {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: Some(mode.into()),
            ..Self::default()
        }
    }

    pub fn all_subscriptions(mut self, all: bool) -> Self {
        self.all_subscriptions = all;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }
}

/// Acknowledgement returned once a run has been handed to its task.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct RunAccepted {
    pub status: String,
    pub run_id: RunId,
}

impl RunAccepted {
    pub(crate) fn new(run_id: RunId) -> Self {
        Self {
            status: "Optimizer started".to_string(),
            run_id,
        }
    }
}

/// Why `start` refused a request. Nothing is spawned in either case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("mode is required")]
    MissingMode,

    #[error("run {run_id} is still in progress")]
    AlreadyRunning { run_id: RunId },
}
