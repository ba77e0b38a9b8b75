// crates/server/src/observability.rs
//! Tracing setup shared by the binary and anything that embeds the server.
//!
//! Two outputs hang off one registry: a compact `fmt` layer on stderr governed
//! by `RUST_LOG`, and the [`LogSinkLayer`] feeding `/api/log-stream`. Each has
//! its own filter, so a quiet `RUST_LOG` never starves the log stream.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::log_sink::{LogSink, LogSinkLayer};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

/// Install the global subscriber.
///
/// Only the first call in a process takes effect; later calls return
/// `false` and leave the existing subscriber alone.
pub fn init_tracing(logs: Arc<LogSink>) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_filter(env_filter))
        .with(LogSinkLayer::new(logs).with_filter(LogSinkLayer::default_filter()))
        .try_init()
        .is_ok()
}
