//! Performance tracking sink
//!
//! A fire-and-forget recorder fed after planning and after execution.
//! Sinks must not block or fail the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape of the input an operation consumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputProfile {
    /// Kind of input, e.g. a task type
    pub kind: String,
    /// Size in characters
    pub size: usize,
    /// Complexity bucket, when classified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
}

/// Shape of the output an operation produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputProfile {
    pub kind: String,
    pub size: usize,
    /// Quality of the output in [0, 100], when measured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

/// One tracked operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub tool_id: String,
    /// Operation name, e.g. `create-plan` or `execute-plan`
    pub operation: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    pub success: bool,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub input: InputProfile,
    pub output: OutputProfile,
}

/// Port for performance record collectors
pub trait PerformanceSink: Send + Sync {
    fn record(&self, record: PerformanceRecord);
}

/// No-op sink
pub struct NoSink;

impl PerformanceSink for NoSink {
    fn record(&self, _record: PerformanceRecord) {}
}
