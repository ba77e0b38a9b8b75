// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use optimizer_hub_core::Analyzer;

use crate::jobs::{JobController, RunSettings};
use crate::log_sink::LogSink;
use crate::result_store::ResultStore;

/// Shared application state accessible from all route handlers.
///
/// Constructed once at startup and handed to the router; nothing here is a
/// module-level global.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Owner of the optimizer run lifecycle.
    pub jobs: Arc<JobController>,
    /// Most recent successful result bundle.
    pub results: Arc<ResultStore>,
    /// Log lines waiting for `/api/log-stream`. Also fed by the tracing layer.
    pub logs: Arc<LogSink>,
    /// Tick interval of the log stream.
    pub stream_interval: Duration,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        analyzer: Arc<dyn Analyzer>,
        logs: Arc<LogSink>,
        settings: RunSettings,
        stream_interval: Duration,
    ) -> Arc<Self> {
        let results = Arc::new(ResultStore::new());
        let jobs = Arc::new(JobController::new(analyzer, Arc::clone(&results), settings));
        Arc::new(Self {
            start_time: Instant::now(),
            jobs,
            results,
            logs,
            stream_interval,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
