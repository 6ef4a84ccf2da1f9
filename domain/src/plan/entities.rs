//! Plan entities
//!
//! A plan is an ordered list of [`ExecutionStage`]s plus an estimate of how
//! long it will take and how confident the planner is. Stages group
//! capabilities that run together under one execution mode.

use crate::core::value::Value;
use crate::task::{TaskRequirements, TaskType};
use serde::{Deserialize, Serialize};

/// How the members of a stage are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// All members dispatched concurrently, awaited together
    Parallel,
    /// Members invoked one at a time, results threaded forward
    Sequential,
    /// Members invoked one at a time, results reconciled into a consensus
    Consensus,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Parallel => write!(f, "parallel"),
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Consensus => write!(f, "consensus"),
        }
    }
}

/// Backoff schedule between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    Exponential,
    Linear,
}

impl Backoff {
    /// Delay before the given retry attempt (1-indexed), in milliseconds
    pub fn delay_ms(&self, attempt: u32, base_ms: u64) -> u64 {
        match self {
            Backoff::Exponential => base_ms.saturating_mul(1u64 << attempt.min(16)),
            Backoff::Linear => base_ms.saturating_mul(attempt as u64),
        }
    }
}

/// Retry policy for capability invocations within a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryStrategy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Capability substituted once if the primary exhausts its attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl RetryStrategy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(2, Backoff::Exponential)
    }
}

/// A group of capabilities invoked together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStage {
    /// Capability identifiers in this stage
    pub capabilities: Vec<String>,
    pub mode: ExecutionMode,
    /// Input payload handed to every member
    pub input: Value,
    /// Result keys later stages may expect from this one
    #[serde(default)]
    pub expected_outputs: Vec<String>,
    /// Advisory time budget in milliseconds; used for retrospective
    /// classification, not preemption
    pub timeout_ms: f64,
    pub retry: RetryStrategy,
}

impl ExecutionStage {
    pub fn new(capabilities: Vec<String>, mode: ExecutionMode, input: Value) -> Self {
        Self {
            capabilities,
            mode,
            input,
            expected_outputs: Vec::new(),
            timeout_ms: 0.0,
            retry: RetryStrategy::default(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: f64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_expected_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_outputs = outputs.into_iter().map(Into::into).collect();
        self
    }
}

/// An alternative staging of the same task, with stated tradeoffs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanAlternative {
    pub description: String,
    pub stages: Vec<ExecutionStage>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// A complete plan derived from one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationPlan {
    pub id: String,
    pub task_type: TaskType,
    /// Requirement targets carried over from the task, consulted at
    /// execution time for success evaluation
    pub requirements: TaskRequirements,
    pub stages: Vec<ExecutionStage>,
    /// Estimated total execution time in milliseconds
    pub estimated_time_ms: f64,
    /// Planner confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable planning trace
    pub reasoning: Vec<String>,
    /// Up to two alternative stagings
    #[serde(default)]
    pub alternatives: Vec<PlanAlternative>,
}

impl OrchestrationPlan {
    /// All capability ids mentioned across stages, in stage order
    pub fn capability_ids(&self) -> Vec<&str> {
        self.stages
            .iter()
            .flat_map(|s| s.capabilities.iter().map(String::as_str))
            .collect()
    }

    /// Whether any stage uses consensus mode
    pub fn uses_consensus(&self) -> bool {
        self.stages
            .iter()
            .any(|s| s.mode == ExecutionMode::Consensus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_doubles() {
        let backoff = Backoff::Exponential;
        assert_eq!(backoff.delay_ms(1, 100), 200);
        assert_eq!(backoff.delay_ms(2, 100), 400);
        assert_eq!(backoff.delay_ms(3, 100), 800);
    }

    #[test]
    fn test_linear_backoff_scales() {
        let backoff = Backoff::Linear;
        assert_eq!(backoff.delay_ms(1, 100), 100);
        assert_eq!(backoff.delay_ms(3, 100), 300);
    }

    #[test]
    fn test_retry_strategy_floors_attempts() {
        let retry = RetryStrategy::new(0, Backoff::Linear);
        assert_eq!(retry.max_attempts, 1);
    }

    #[test]
    fn test_stage_builder() {
        let stage = ExecutionStage::new(
            vec!["code-reviewer".to_string()],
            ExecutionMode::Sequential,
            Value::text("input"),
        )
        .with_timeout_ms(1200.0)
        .with_retry(RetryStrategy::new(3, Backoff::Exponential).with_fallback("metrics-analyzer"));

        assert_eq!(stage.timeout_ms, 1200.0);
        assert_eq!(stage.retry.max_attempts, 3);
        assert_eq!(stage.retry.fallback.as_deref(), Some("metrics-analyzer"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ExecutionMode::Parallel.to_string(), "parallel");
        assert_eq!(ExecutionMode::Consensus.to_string(), "consensus");
    }
}
