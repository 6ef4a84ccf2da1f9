//! Bounded per-key orchestration history
//!
//! Completed runs are bucketed by task type and quality target. Planning
//! consults the bucket for tools that keep showing up in successful runs.

use conductor_domain::TaskType;
use std::collections::{BTreeMap, VecDeque};

/// One completed run in a history bucket
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Capability ids the plan used, in stage order
    pub tools: Vec<String>,
    pub success: bool,
    pub duration_ms: f64,
}

/// Bucketed, bounded run history
#[derive(Debug, Default)]
pub struct TaskHistory {
    buckets: BTreeMap<String, VecDeque<HistoryEntry>>,
}

impl TaskHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest past the cap
    pub fn record(&mut self, key: &str, entry: HistoryEntry, cap: usize) {
        let bucket = self.buckets.entry(key.to_string()).or_default();
        bucket.push_back(entry);
        while bucket.len() > cap {
            bucket.pop_front();
        }
    }

    pub fn len(&self, key: &str) -> usize {
        self.buckets.get(key).map(VecDeque::len).unwrap_or(0)
    }

    /// Tools present in at least `threshold` of the bucket's successful runs
    ///
    /// Empty when the bucket has no successful runs yet.
    pub fn frequent_successful_tools(&self, key: &str, threshold: f64) -> Vec<String> {
        let Some(bucket) = self.buckets.get(key) else {
            return Vec::new();
        };
        let successful: Vec<&HistoryEntry> = bucket.iter().filter(|e| e.success).collect();
        if successful.is_empty() {
            return Vec::new();
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &successful {
            for tool in &entry.tools {
                *counts.entry(tool).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count as f64 / successful.len() as f64 >= threshold)
            .map(|(tool, _)| tool.to_string())
            .collect()
    }
}

/// Bucket key for a task type and quality target
///
/// Quality targets collapse into coarse tiers so near-identical tasks share
/// history.
pub fn history_key(task_type: TaskType, quality: Option<f64>) -> String {
    let tier = match quality {
        None => "default",
        Some(q) if q <= 75.0 => "standard",
        Some(q) if q <= 90.0 => "high",
        Some(_) => "premium",
    };
    format!("{task_type}:{tier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tools: &[&str], success: bool) -> HistoryEntry {
        HistoryEntry {
            tools: tools.iter().map(|t| t.to_string()).collect(),
            success,
            duration_ms: 100.0,
        }
    }

    #[test]
    fn test_history_key_tiers() {
        assert_eq!(history_key(TaskType::Analysis, None), "analysis:default");
        assert_eq!(history_key(TaskType::Analysis, Some(70.0)), "analysis:standard");
        assert_eq!(history_key(TaskType::Security, Some(85.0)), "security:high");
        assert_eq!(history_key(TaskType::Security, Some(95.0)), "security:premium");
    }

    #[test]
    fn test_history_bounded_per_bucket() {
        let mut history = TaskHistory::new();
        for _ in 0..150 {
            history.record("analysis:default", entry(&["code-reviewer"], true), 100);
        }
        assert_eq!(history.len("analysis:default"), 100);
    }

    #[test]
    fn test_frequent_tools_respect_threshold() {
        let mut history = TaskHistory::new();
        let key = "analysis:high";
        for _ in 0..8 {
            history.record(key, entry(&["code-reviewer", "metrics-analyzer"], true), 100);
        }
        for _ in 0..2 {
            history.record(key, entry(&["pattern-detector"], true), 100);
        }
        // failures never count toward frequency
        for _ in 0..5 {
            history.record(key, entry(&["doc-writer"], false), 100);
        }

        let frequent = history.frequent_successful_tools(key, 0.7);
        assert_eq!(frequent, vec!["code-reviewer".to_string(), "metrics-analyzer".to_string()]);
    }

    #[test]
    fn test_frequent_tools_empty_without_successes() {
        let mut history = TaskHistory::new();
        history.record("analysis:default", entry(&["code-reviewer"], false), 100);
        assert!(history
            .frequent_successful_tools("analysis:default", 0.7)
            .is_empty());
        assert!(history.frequent_successful_tools("missing", 0.7).is_empty());
    }
}
