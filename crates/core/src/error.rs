use thiserror::Error;

/// Errors raised by an analysis routine.
///
/// The `Display` text is what ends up in the `Error: <message>` job status,
/// so variants carry human-readable context rather than codes alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("failed to spawn analysis routine: {0}")]
    SpawnFailed(String),

    #[error("analysis routine exited with code {code:?}: {stderr}")]
    ExitFailure { code: Option<i32>, stderr: String },

    #[error("malformed analysis output: {0}")]
    MalformedOutput(String),

    #[error("{0}")]
    Failed(String),
}

impl AnalysisError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
