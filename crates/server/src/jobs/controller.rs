// crates/server/src/jobs/controller.rs
//! Owns the optimizer run lifecycle: spawning, the deadline-bounded polling
//! loop, status transitions and the hand-off of results to the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use optimizer_hub_core::{AnalysisOutcome, AnalysisRequest, Analyzer};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::types::{JobStatus, RunAccepted, RunId, RunRequest, StartError};
use crate::result_store::ResultStore;

/// Status message recorded when a run is cancelled through [`JobController::cancel`].
pub const CANCELLED_MESSAGE: &str = "run cancelled";
/// Status message recorded when the routine answered without any result.
pub const NO_RESULT_MESSAGE: &str = "analysis routine returned no result";

/// Timing knobs for runs.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// Deadline used when a request does not carry `timeout`.
    pub default_timeout: Duration,
    /// Pause between re-invocations while the routine reports `Pending`.
    pub poll_interval: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Status together with the run it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    /// `None` until the first run's task has started.
    pub run_id: Option<RunId>,
    pub status: JobStatus,
}

struct ActiveRun {
    id: RunId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Everything a run task needs, cloned out of the controller.
#[derive(Clone)]
struct RunContext {
    analyzer: Arc<dyn Analyzer>,
    results: Arc<ResultStore>,
    status_tx: Arc<watch::Sender<RunSnapshot>>,
    poll_interval: Duration,
}

impl RunContext {
    fn set_status(&self, run_id: RunId, status: JobStatus) {
        self.status_tx.send_replace(RunSnapshot {
            run_id: Some(run_id),
            status,
        });
    }
}

#[derive(Clone)]
struct PlannedRun {
    id: RunId,
    request: AnalysisRequest,
    timeout: Duration,
    cancel: CancellationToken,
}

/// Single-slot controller for background optimizer runs.
///
/// `start` returns as soon as the run task is spawned. A second `start`
/// is rejected until the previous run has published its terminal status,
/// which is that task's last write, so at most one task ever writes the
/// status or the result store.
pub struct JobController {
    ctx: RunContext,
    settings: RunSettings,
    next_id: AtomicU64,
    active: Mutex<Option<ActiveRun>>,
}

impl JobController {
    pub fn new(analyzer: Arc<dyn Analyzer>, results: Arc<ResultStore>, settings: RunSettings) -> Self {
        let (status_tx, _) = watch::channel(RunSnapshot::default());
        Self {
            ctx: RunContext {
                analyzer,
                results,
                status_tx: Arc::new(status_tx),
                poll_interval: settings.poll_interval,
            },
            settings,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
        }
    }

    /// Validate the request and spawn its run.
    ///
    /// The `Running` transition happens inside the spawned task, so a
    /// `status()` call racing with `start` may still see the previous value.
    pub fn start(&self, request: RunRequest) -> Result<RunAccepted, StartError> {
        let mode = request
            .mode
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or(StartError::MissingMode)?;

        let mut active = self.lock_active();
        if let Some(run) = active.as_ref().filter(|r| self.holds_slot(r)) {
            return Err(StartError::AlreadyRunning { run_id: run.id });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let planned = PlannedRun {
            id,
            request: AnalysisRequest::new(mode, request.all_subscriptions),
            timeout: request
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(self.settings.default_timeout),
            cancel: cancel.clone(),
        };

        let handle = tokio::spawn(drive(self.ctx.clone(), planned));
        *active = Some(ActiveRun { id, cancel, handle });

        Ok(RunAccepted::new(id))
    }

    /// Current status; pure read.
    pub fn status(&self) -> JobStatus {
        self.ctx.status_tx.borrow().status.clone()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.ctx.status_tx.borrow().clone()
    }

    /// Receiver that observes every status transition.
    pub fn subscribe_status(&self) -> watch::Receiver<RunSnapshot> {
        self.ctx.status_tx.subscribe()
    }

    /// Whether a run still holds the slot.
    pub fn is_busy(&self) -> bool {
        self.lock_active()
            .as_ref()
            .is_some_and(|r| self.holds_slot(r))
    }

    /// Abort the active run, including an in-flight analysis call.
    /// Returns `false` when nothing is running.
    pub fn cancel(&self) -> bool {
        match self.lock_active().as_ref() {
            Some(run) if self.holds_slot(run) => {
                tracing::info!(run_id = run.id, "Cancellation requested");
                run.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Wait until `run_id` reaches a terminal status and return it.
    pub async fn wait_for_run(&self, run_id: RunId) -> JobStatus {
        let mut rx = self.subscribe_status();
        let status = match rx
            .wait_for(|s| s.run_id == Some(run_id) && s.status.is_terminal())
            .await
        {
            Ok(snap) => snap.status.clone(),
            // The sender lives as long as `self`, so this is unreachable in practice.
            Err(_) => self.status(),
        };
        status
    }

    /// A run holds the slot until its task exits or its terminal status is
    /// published, whichever comes first. Nothing writes after that status.
    fn holds_slot(&self, run: &ActiveRun) -> bool {
        if run.handle.is_finished() {
            return false;
        }
        let snap = self.ctx.status_tx.borrow();
        !(snap.run_id == Some(run.id) && snap.status.is_terminal())
    }

    // The guarded Option is always in a consistent state, so a poisoned
    // lock is recovered rather than surfaced.
    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Body of the spawned task: status bookkeeping around [`execute`].
async fn drive(ctx: RunContext, run: PlannedRun) {
    let run_id = run.id;
    ctx.set_status(run_id, JobStatus::Running);
    metrics::counter!("optimizer_runs_started_total").increment(1);
    tracing::info!(
        run_id,
        mode = %run.request.mode,
        all_subscriptions = run.request.all_subscriptions,
        timeout_secs = run.timeout.as_secs(),
        analyzer = ctx.analyzer.name(),
        "Optimizer started"
    );

    let started = Instant::now();
    // Run the loop in its own task so a panicking analyzer still ends in a
    // terminal status instead of leaving `Running` behind.
    let status = match tokio::spawn(execute(ctx.clone(), run, started)).await {
        Ok(status) => status,
        Err(e) if e.is_panic() => JobStatus::Error("analysis routine panicked".to_string()),
        Err(e) => JobStatus::Error(e.to_string()),
    };

    let elapsed = started.elapsed();
    match &status {
        JobStatus::Completed => tracing::info!(
            run_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Optimizer completed"
        ),
        JobStatus::Timeout => tracing::error!(
            run_id,
            elapsed_ms = elapsed.as_millis() as u64,
            "Optimizer timeout"
        ),
        JobStatus::Error(message) => tracing::error!(run_id, "Optimizer error: {message}"),
        JobStatus::Idle | JobStatus::Running => {}
    }
    metrics::histogram!("optimizer_run_duration_seconds").record(elapsed.as_secs_f64());
    metrics::counter!("optimizer_runs_finished_total", "outcome" => status.label()).increment(1);

    // Last write of the run; `start` treats the slot as free from here on.
    ctx.set_status(run_id, status);
}

/// The polling loop. Returns the run's terminal status.
///
/// The deadline is checked at the top of every iteration. An analysis call
/// already in flight is only interrupted by cancellation, never by the
/// deadline, so one slow call can overrun `timeout`.
async fn execute(ctx: RunContext, run: PlannedRun, started: Instant) -> JobStatus {
    let mut attempt = 0u32;
    loop {
        if started.elapsed() >= run.timeout {
            return JobStatus::Timeout;
        }
        attempt += 1;

        let result = tokio::select! {
            biased;
            _ = run.cancel.cancelled() => return JobStatus::Error(CANCELLED_MESSAGE.to_string()),
            result = ctx.analyzer.analyze(&run.request) => result,
        };

        match result {
            Ok(AnalysisOutcome::Ready(bundle)) => {
                let records = bundle.total_records();
                return match ctx.results.publish(bundle) {
                    Ok(()) => {
                        tracing::info!(run_id = run.id, attempt, records, "Results published");
                        JobStatus::Completed
                    }
                    Err(e) => JobStatus::Error(e.to_string()),
                };
            }
            Ok(AnalysisOutcome::NoResult) => return JobStatus::Error(NO_RESULT_MESSAGE.to_string()),
            Err(e) => return JobStatus::Error(e.to_string()),
            Ok(AnalysisOutcome::Pending) => {
                let remaining = run.timeout.saturating_sub(started.elapsed());
                let pause = ctx.poll_interval.min(remaining);
                tracing::debug!(
                    run_id = run.id,
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    "Analysis pending, polling again"
                );
                tokio::select! {
                    biased;
                    _ = run.cancel.cancelled() => return JobStatus::Error(CANCELLED_MESSAGE.to_string()),
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }
    }
}
