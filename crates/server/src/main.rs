// crates/server/src/main.rs
//! optimizer-hub server binary.
//!
//! Parses configuration, wires tracing into the shared log sink, then serves
//! the API until Ctrl-C. Shutdown cancels any run still in progress.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use optimizer_hub_core::CommandAnalyzer;
use optimizer_hub_server::log_sink::LogSink;
use optimizer_hub_server::metrics::init_metrics;
use optimizer_hub_server::observability::init_tracing;
use optimizer_hub_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    config.validate()?;

    // The sink must exist before the subscriber so startup lines reach the stream.
    let logs = Arc::new(LogSink::new(config.log_capacity));
    init_tracing(Arc::clone(&logs));
    init_metrics();

    let analyzer = Arc::new(
        CommandAnalyzer::new(&config.analyzer).with_args(config.analyzer_args.iter().cloned()),
    );
    let state = AppState::new(
        analyzer,
        logs,
        config.run_settings(),
        config.stream_interval(),
    );
    let app = create_app(Arc::clone(&state));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        analyzer = %config.analyzer,
        version = env!("CARGO_PKG_VERSION"),
        "optimizer-hub listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling the active run first so its child process
/// is killed before the runtime goes away.
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    if state.jobs.cancel() {
        tracing::info!("Cancelled active optimizer run");
    }
}
