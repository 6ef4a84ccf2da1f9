//! In-memory performance sink
//!
//! Buffers performance records for inspection. Used in tests and by hosts
//! that export records themselves.

use conductor_application::ports::performance_sink::{PerformanceRecord, PerformanceSink};
use std::sync::Mutex;

/// Sink backed by an in-process buffer
#[derive(Debug, Default)]
pub struct MemoryPerformanceSink {
    records: Mutex<Vec<PerformanceRecord>>,
}

impl MemoryPerformanceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Records for one operation name, e.g. `create-plan`
    pub fn records_for(&self, operation: &str) -> Vec<PerformanceRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.operation == operation)
            .cloned()
            .collect()
    }
}

impl PerformanceSink for MemoryPerformanceSink {
    fn record(&self, record: PerformanceRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}
