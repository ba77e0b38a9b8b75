// crates/core/src/bundle.rs
//! The result bundle produced by one successful analysis run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the five named sequences in a [`ResultBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultField {
    SummaryReports,
    StatusLog,
    ImpactedResources,
    TrendData,
    Anomalies,
}

impl ResultField {
    pub const ALL: [ResultField; 5] = [
        Self::SummaryReports,
        Self::StatusLog,
        Self::ImpactedResources,
        Self::TrendData,
        Self::Anomalies,
    ];

    /// Key used by the analysis routine's JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SummaryReports => "summary_reports",
            Self::StatusLog => "status_log",
            Self::ImpactedResources => "impacted_resources",
            Self::TrendData => "trend_data",
            Self::Anomalies => "anomalies",
        }
    }
}

impl std::fmt::Display for ResultField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five ordered sequences of opaque records.
///
/// The record schema belongs to the analysis routine; nothing in this
/// workspace looks inside a record. Missing keys deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    #[serde(default)]
    pub summary_reports: Vec<Value>,
    #[serde(default)]
    pub status_log: Vec<Value>,
    #[serde(default)]
    pub impacted_resources: Vec<Value>,
    #[serde(default)]
    pub trend_data: Vec<Value>,
    #[serde(default)]
    pub anomalies: Vec<Value>,
}

impl ResultBundle {
    pub fn field(&self, field: ResultField) -> &[Value] {
        match field {
            ResultField::SummaryReports => &self.summary_reports,
            ResultField::StatusLog => &self.status_log,
            ResultField::ImpactedResources => &self.impacted_resources,
            ResultField::TrendData => &self.trend_data,
            ResultField::Anomalies => &self.anomalies,
        }
    }

    pub fn total_records(&self) -> usize {
        ResultField::ALL.iter().map(|f| self.field(*f).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }
}
