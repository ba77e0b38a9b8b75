// crates/server/src/routes/log_stream.rs
//! Server-push log stream.
//!
//! - GET /log-stream - SSE, one unnamed `data:` event per log line
//!
//! Every tick drains at most one line from the shared [`LogSink`]. The sink
//! is a single queue, so concurrent viewers split the lines between them:
//! each line reaches exactly one connection and nothing is replayed.
//!
//! [`LogSink`]: crate::log_sink::LogSink

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use tokio::time::MissedTickBehavior;

use crate::state::AppState;

/// GET /api/log-stream - drain the log sink on a fixed cadence.
///
/// Runs until the client disconnects (axum drops the stream). Idle ticks send
/// nothing; keep-alive comments hold the connection open through proxies.
pub async fn log_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let logs = Arc::clone(&state.logs);
    let period = state.stream_interval;

    let stream = async_stream::stream! {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(line) = logs.drain_one() {
                // SSE fields cannot carry carriage returns.
                yield Ok(Event::default().data(line.replace('\r', "")));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Build the log stream router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/log-stream", get(log_stream))
}
