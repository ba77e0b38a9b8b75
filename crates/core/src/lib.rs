// crates/core/src/lib.rs
//! Core types for optimizer-hub: the result bundle, the analyzer seam and
//! the process-backed analyzer.

pub mod analyzer;
pub mod bundle;
pub mod command;
pub mod error;

pub use analyzer::{AnalysisOutcome, AnalysisRequest, Analyzer};
pub use bundle::{ResultBundle, ResultField};
pub use command::CommandAnalyzer;
pub use error::AnalysisError;
