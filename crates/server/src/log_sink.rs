// crates/server/src/log_sink.rs
//! Bounded FIFO of formatted log lines awaiting delivery to the log stream.
//!
//! [`LogSinkLayer`] feeds the queue from `tracing`; the `/api/log-stream`
//! handler drains it one line per tick.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::{Context, Layer};

/// Default number of lines held before the oldest is dropped.
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

/// Append-only, consumer-drained queue of log lines.
///
/// `append` never blocks on a consumer: once `capacity` lines are queued the
/// oldest is discarded and counted in [`LogSink::dropped`].
pub struct LogSink {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    dropped: AtomicU64,
}

impl LogSink {
    /// Create a sink holding at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        if lines.len() >= self.capacity {
            lines.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("optimizer_log_lines_dropped_total").increment(1);
        }
        lines.push_back(line.into());
    }

    /// Remove and return the oldest line, or `None` when the queue is empty.
    pub fn drain_one(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    // A panic while holding the lock leaves a valid VecDeque behind, so the
    // poisoned guard is recovered instead of logged (logging here would
    // re-enter the sink through the tracing layer).
    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

/// `tracing` layer that formats each event and appends it to a [`LogSink`].
///
/// Line shape: `2026-10-15 09:30:01,482 - optimizer_hub_server::jobs::controller - INFO - Optimizer started mode=dry-run`
pub struct LogSinkLayer {
    sink: Arc<LogSink>,
}

impl LogSinkLayer {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }

    /// Only the workspace's own events at INFO and above reach the stream;
    /// HTTP access logs and dependency chatter stay on stderr.
    pub fn default_filter() -> Targets {
        Targets::new()
            .with_target("optimizer_hub_server", Level::INFO)
            .with_target("optimizer_hub_core", Level::INFO)
    }
}

impl<S: Subscriber> Layer<S> for LogSinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        self.sink.append(format_line(
            &timestamp.to_string(),
            meta.target(),
            meta.level(),
            &visitor.finish(),
        ));
    }
}

pub(crate) fn format_line(timestamp: &str, target: &str, level: &Level, body: &str) -> String {
    format!("{timestamp} - {target} - {level} - {body}")
}

/// Collects the `message` field plus `key=value` pairs for the rest.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: std::fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_fifo_order_then_empty() {
        let sink = LogSink::new(16);
        sink.append("L1");
        sink.append("L2");
        sink.append("L3");

        assert_eq!(sink.drain_one().as_deref(), Some("L1"));
        assert_eq!(sink.drain_one().as_deref(), Some("L2"));
        assert_eq!(sink.drain_one().as_deref(), Some("L3"));
        assert_eq!(sink.drain_one(), None);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_full_sink_drops_oldest() {
        let sink = LogSink::new(2);
        sink.append("a");
        sink.append("b");
        sink.append("c");

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(sink.drain_one().as_deref(), Some("b"));
        assert_eq!(sink.drain_one().as_deref(), Some("c"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let sink = LogSink::new(0);
        assert_eq!(sink.capacity(), 1);
        sink.append("only");
        sink.append("newer");
        assert_eq!(sink.drain_one().as_deref(), Some("newer"));
    }

    #[test]
    fn test_concurrent_appends_all_arrive() {
        let sink = Arc::new(LogSink::new(1_000));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.append(format!("t{t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.len(), 200);
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn test_format_line_shape() {
        let line = format_line(
            "2026-10-15 09:30:01,482",
            "optimizer_hub_server::jobs",
            &Level::ERROR,
            "Optimizer timeout",
        );
        assert_eq!(
            line,
            "2026-10-15 09:30:01,482 - optimizer_hub_server::jobs - ERROR - Optimizer timeout"
        );
    }

    #[test]
    fn test_layer_captures_message_and_fields() {
        let sink = Arc::new(LogSink::new(16));
        let subscriber =
            tracing_subscriber::registry().with(LogSinkLayer::new(Arc::clone(&sink)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(run_id = 7, mode = "dry-run", "Optimizer started");
        });

        let line = sink.drain_one().expect("one line");
        assert!(line.contains(" - INFO - Optimizer started run_id=7 mode=dry-run"), "{line}");
        assert_eq!(sink.drain_one(), None);
    }

    #[test]
    fn test_default_filter_skips_foreign_targets() {
        let sink = Arc::new(LogSink::new(16));
        let subscriber = tracing_subscriber::registry().with(
            LogSinkLayer::new(Arc::clone(&sink)).with_filter(LogSinkLayer::default_filter()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "tower_http::trace", "request");
            tracing::debug!("too verbose");
            tracing::warn!("kept");
        });

        let line = sink.drain_one().expect("warn line kept");
        assert!(line.ends_with(" - WARN - kept"), "{line}");
        assert_eq!(sink.drain_one(), None);
    }
}
