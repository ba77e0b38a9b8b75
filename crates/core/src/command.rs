// crates/core/src/command.rs
//! Process-backed analyzer - spawns the analysis program and parses JSON output.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::analyzer::{AnalysisOutcome, AnalysisRequest, Analyzer};
use crate::bundle::ResultBundle;
use crate::error::AnalysisError;

/// Exit code (`EX_TEMPFAIL`) the program uses to say "no result yet, ask again".
pub const PENDING_EXIT_CODE: i32 = 75;

/// Longest stderr excerpt carried into an error message.
const STDERR_LIMIT: usize = 500;

/// Analyzer that runs an external program once per invocation.
///
/// Command: `{program} {args...} --mode {mode} [--all-subscriptions]`
///
/// The child is killed if the future is dropped, so cancelling a run also
/// stops the program.
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Fixed arguments placed before the per-run flags.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, request: &AnalysisRequest) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args).arg("--mode").arg(&request.mode);
        if request.all_subscriptions {
            cmd.arg("--all-subscriptions");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let t0 = Instant::now();
        tracing::info!(
            program = %self.program,
            mode = %request.mode,
            all_subscriptions = request.all_subscriptions,
            "analysis routine: spawning"
        );

        let output = self.command(request).output().await.map_err(|e| {
            tracing::error!(program = %self.program, error = %e, "analysis routine: failed to spawn");
            AnalysisError::SpawnFailed(e.to_string())
        })?;

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let outcome = interpret_output(output.status.code(), &stdout, &stderr);

        match &outcome {
            Ok(AnalysisOutcome::Ready(bundle)) => tracing::info!(
                elapsed_ms,
                records = bundle.total_records(),
                "analysis routine: result ready"
            ),
            Ok(AnalysisOutcome::Pending) => {
                tracing::info!(elapsed_ms, "analysis routine: result pending")
            }
            Ok(AnalysisOutcome::NoResult) => {
                tracing::warn!(elapsed_ms, "analysis routine: empty output")
            }
            Err(e) => tracing::error!(elapsed_ms, error = %e, "analysis routine: failed"),
        }
        outcome
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Map an exit code plus captured output onto an outcome.
///
/// `None` for the code means the process was terminated by a signal.
pub fn interpret_output(
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<AnalysisOutcome, AnalysisError> {
    match code {
        Some(0) => {}
        Some(PENDING_EXIT_CODE) => return Ok(AnalysisOutcome::Pending),
        code => {
            return Err(AnalysisError::ExitFailure {
                code,
                stderr: truncate(stderr.trim(), STDERR_LIMIT),
            })
        }
    }

    let body = stdout.trim();
    if body.is_empty() {
        return Ok(AnalysisOutcome::NoResult);
    }

    let parsed: Option<ResultBundle> = serde_json::from_str(body)
        .map_err(|e| AnalysisError::MalformedOutput(e.to_string()))?;
    Ok(parsed.map_or(AnalysisOutcome::NoResult, AnalysisOutcome::Ready))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_interpret_ready() {
        let out = r#"{"summary_reports": [{"total": 12.5}], "anomalies": []}"#;
        let outcome = interpret_output(Some(0), out, "").unwrap();
        match outcome {
            AnalysisOutcome::Ready(bundle) => {
                assert_eq!(bundle.summary_reports, vec![json!({"total": 12.5})]);
                assert!(bundle.anomalies.is_empty());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_blank_and_null_are_no_result() {
        assert_eq!(interpret_output(Some(0), "  \n", "").unwrap(), AnalysisOutcome::NoResult);
        assert_eq!(interpret_output(Some(0), "null", "").unwrap(), AnalysisOutcome::NoResult);
    }

    #[test]
    fn test_interpret_pending_exit_code() {
        assert_eq!(
            interpret_output(Some(PENDING_EXIT_CODE), "", "").unwrap(),
            AnalysisOutcome::Pending
        );
    }

    #[test]
    fn test_interpret_failure_truncates_stderr() {
        let stderr = "x".repeat(2_000);
        let err = interpret_output(Some(1), "", &stderr).unwrap_err();
        match err {
            AnalysisError::ExitFailure { code, stderr } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr.len(), STDERR_LIMIT);
            }
            other => panic!("expected ExitFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_signal_is_failure() {
        let err = interpret_output(None, "", "killed").unwrap_err();
        assert!(matches!(err, AnalysisError::ExitFailure { code: None, .. }));
    }

    #[test]
    fn test_interpret_malformed_json() {
        let err = interpret_output(Some(0), "{not json", "").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedOutput(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_flags() {
        // `sh -c <script> analyzer --mode ... [--all-subscriptions]`
        let script = r#"printf '{"status_log": ["%s", "%s", "%s"]}' "$1" "$2" "$3""#;
        let analyzer = CommandAnalyzer::new("sh").with_args(["-c", script, "analyzer"]);

        let outcome = analyzer
            .analyze(&AnalysisRequest::new("apply", true))
            .await
            .unwrap();

        let AnalysisOutcome::Ready(bundle) = outcome else {
            panic!("expected Ready, got {outcome:?}");
        };
        assert_eq!(
            bundle.status_log,
            vec![json!("--mode"), json!("apply"), json!("--all-subscriptions")]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_nonzero_exit_captures_stderr() {
        let analyzer = CommandAnalyzer::new("sh")
            .with_args(["-c", "echo 'credentials expired' >&2; exit 3", "analyzer"]);

        let err = analyzer
            .analyze(&AnalysisRequest::new("dry-run", false))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "analysis routine exited with code Some(3): credentials expired"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_pending_exit() {
        let analyzer = CommandAnalyzer::new("sh").with_args(["-c", "exit 75", "analyzer"]);
        let outcome = analyzer
            .analyze(&AnalysisRequest::new("dry-run", false))
            .await
            .unwrap();
        assert_eq!(outcome, AnalysisOutcome::Pending);
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_failure() {
        let analyzer = CommandAnalyzer::new("/nonexistent/optimizer-hub-analyzer");
        let err = analyzer
            .analyze(&AnalysisRequest::new("dry-run", false))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SpawnFailed(_)));
        assert_eq!(analyzer.name(), "/nonexistent/optimizer-hub-analyzer");
    }
}
