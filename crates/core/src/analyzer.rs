// crates/core/src/analyzer.rs
//! Analyzer trait defining the interface to the external analysis routine.

use async_trait::async_trait;

use crate::bundle::ResultBundle;
use crate::error::AnalysisError;

/// Input passed through to the analysis routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub mode: String,
    pub all_subscriptions: bool,
}

impl AnalysisRequest {
    pub fn new(mode: impl Into<String>, all_subscriptions: bool) -> Self {
        Self {
            mode: mode.into(),
            all_subscriptions,
        }
    }
}

/// What one invocation of the routine produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// A complete bundle, ready to publish.
    Ready(ResultBundle),
    /// Nothing yet; the caller may invoke again after a pause.
    Pending,
    /// The routine ran but returned no result at all.
    NoResult,
}

/// The external analysis routine (cost computation, resource scanning,
/// anomaly detection).
///
/// Implementations include:
/// - `CommandAnalyzer` - runs an external program and parses its JSON output
/// - test doubles in the server crate
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError>;

    /// Name for logging (e.g. the program path).
    fn name(&self) -> &str;
}
