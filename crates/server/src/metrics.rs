//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric descriptions for the run lifecycle and the log sink
//! - Rendering for the `/metrics` endpoint
//!
//! Counters are recorded at their call sites (`jobs::controller`,
//! `log_sink`); with no recorder installed those calls are no-ops.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(
        "optimizer_runs_started_total",
        "Number of optimizer runs whose task has started"
    );
    describe_counter!(
        "optimizer_runs_finished_total",
        "Number of optimizer runs that reached a terminal status, by outcome"
    );
    describe_histogram!(
        "optimizer_run_duration_seconds",
        "Wall-clock duration of optimizer runs in seconds"
    );
    describe_counter!(
        "optimizer_log_lines_dropped_total",
        "Log lines discarded because the log stream queue was full"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}
