//! JSONL file writer for performance records
//!
//! Each [`PerformanceRecord`] is serialized as a single JSON line and
//! appended through a buffered writer. Recording never fails the caller;
//! write errors are logged and dropped.

use conductor_application::ports::performance_sink::{PerformanceRecord, PerformanceSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Performance sink that writes one JSON object per line
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlPerformanceSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlPerformanceSink {
    /// Create a sink writing to the given path
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create performance log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not create performance log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered lines to disk
    pub fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.flush() {
            warn!("Could not flush performance log {}: {}", self.path.display(), e);
        }
    }
}

impl PerformanceSink for JsonlPerformanceSink {
    fn record(&self, record: PerformanceRecord) {
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not serialize performance record: {}", e);
                return;
            }
        };
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{line}") {
            warn!("Could not write performance record to {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for JsonlPerformanceSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use conductor_application::ports::performance_sink::{InputProfile, OutputProfile};

    fn record() -> PerformanceRecord {
        PerformanceRecord {
            tool_id: "orchestrator".to_string(),
            operation: "create-plan".to_string(),
            timestamp: Utc::now(),
            duration_ms: 12.5,
            success: true,
            confidence: 0.9,
            input: InputProfile {
                kind: "analysis".to_string(),
                size: 42,
                complexity: Some("simple".to_string()),
            },
            output: OutputProfile {
                kind: "plan".to_string(),
                size: 1,
                quality: None,
            },
        }
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.jsonl");
        let sink = JsonlPerformanceSink::new(&path).unwrap();

        sink.record(record());
        sink.record(record());
        sink.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["operation"], "create-plan");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("perf.jsonl");
        let sink = JsonlPerformanceSink::new(&path).unwrap();
        sink.record(record());
        sink.flush();
        assert!(path.exists());
    }
}
