//! Outcome value objects
//!
//! These types represent the outputs of executing a plan:
//! - [`CapabilityOutcome`] - one capability's result or error marker
//! - [`ConsensusResult`] - the reconciled view across disagreeing results
//! - [`OrchestrationLearning`] - retrospective per-stage observations
//! - [`OrchestrationResult`] - the complete execution outcome

use crate::core::value::Value;
use crate::plan::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result slot for one capability: a value, or an inline error marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CapabilityOutcome {
    Success { value: Value },
    Failed { error: String },
}

impl CapabilityOutcome {
    pub fn success(value: Value) -> Self {
        CapabilityOutcome::Success { value }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CapabilityOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CapabilityOutcome::Failed { .. })
    }

    /// The result value, if this outcome succeeded
    pub fn value(&self) -> Option<&Value> {
        match self {
            CapabilityOutcome::Success { value } => Some(value),
            CapabilityOutcome::Failed { .. } => None,
        }
    }
}

/// How a disputed aspect was settled during consensus building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AspectResolution {
    /// A designated authoritative capability contributed a value
    Expert { capability: String },
    /// A value held a strict majority of contributors
    Majority,
    /// Highest summed quality weight among candidate values
    QualityWeighted,
}

/// One aspect on which contributors disagreed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectConflict {
    pub aspect: String,
    /// Capabilities that contributed a value for this aspect
    pub contributors: Vec<String>,
    pub resolved_by: AspectResolution,
}

/// Reconciled view across capability results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Agreed value per aspect
    pub outcome: BTreeMap<String, Value>,
    /// Fraction of aspects with no disagreement, in [0, 1]
    pub agreement_level: f64,
    /// Overall confidence in [0, 1]
    pub confidence: f64,
    /// Aspects that needed conflict resolution
    pub conflicts: Vec<AspectConflict>,
}

/// Timing record for one executed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage index within the plan
    pub stage: usize,
    pub mode: ExecutionMode,
    pub duration_ms: f64,
    /// The stage's advisory budget
    pub timeout_ms: f64,
    /// Agreement level, for consensus stages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<f64>,
}

/// A retrospective observation derived from one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationLearning {
    pub stage: usize,
    /// Short label, e.g. `slow-execution` or `efficient-parallel`
    pub label: String,
    /// Whether this observation is favorable
    pub positive: bool,
    pub note: String,
}

impl OrchestrationLearning {
    pub fn positive(stage: usize, label: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            stage,
            label: label.into(),
            positive: true,
            note: note.into(),
        }
    }

    pub fn negative(stage: usize, label: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            stage,
            label: label.into(),
            positive: false,
            note: note.into(),
        }
    }
}

/// Complete outcome of executing a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub plan_id: String,
    pub success: bool,
    /// Result slot per capability id (or `consensus` for consensus stages)
    pub results: BTreeMap<String, CapabilityOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusResult>,
    pub stage_timings: Vec<StageTiming>,
    /// Measured wall time per capability, in milliseconds
    pub tool_durations_ms: BTreeMap<String, f64>,
    pub learnings: Vec<OrchestrationLearning>,
    /// Generated explanation of what happened
    pub explanation: String,
}

impl OrchestrationResult {
    /// Whether any result slot carries an error marker
    pub fn has_errors(&self) -> bool {
        self.results.values().any(CapabilityOutcome::is_error)
    }

    /// Mean of the named numeric field across successful result values
    ///
    /// Returns `None` when no result exposes the field.
    pub fn mean_field(&self, field: &str) -> Option<f64> {
        let values: Vec<f64> = self
            .results
            .values()
            .filter_map(CapabilityOutcome::value)
            .filter_map(|v| v.get(field))
            .filter_map(Value::as_number)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(results: BTreeMap<String, CapabilityOutcome>) -> OrchestrationResult {
        OrchestrationResult {
            plan_id: "plan-1".to_string(),
            success: true,
            results,
            consensus: None,
            stage_timings: Vec::new(),
            tool_durations_ms: BTreeMap::new(),
            learnings: Vec::new(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_outcome_error_marker() {
        let ok = CapabilityOutcome::success(Value::number(1.0));
        let failed = CapabilityOutcome::failed("timed out");
        assert!(!ok.is_error());
        assert!(failed.is_error());
        assert!(failed.value().is_none());
    }

    #[test]
    fn test_has_errors() {
        let mut results = BTreeMap::new();
        results.insert(
            "code-reviewer".to_string(),
            CapabilityOutcome::success(Value::map([("quality", Value::number(90.0))])),
        );
        assert!(!result_with(results.clone()).has_errors());

        results.insert(
            "security-scanner".to_string(),
            CapabilityOutcome::failed("no response"),
        );
        assert!(result_with(results).has_errors());
    }

    #[test]
    fn test_mean_field_across_results() {
        let mut results = BTreeMap::new();
        results.insert(
            "a".to_string(),
            CapabilityOutcome::success(Value::map([("quality", Value::number(80.0))])),
        );
        results.insert(
            "b".to_string(),
            CapabilityOutcome::success(Value::map([("quality", Value::number(90.0))])),
        );
        // no quality field, excluded from the mean
        results.insert(
            "c".to_string(),
            CapabilityOutcome::success(Value::map([("coverage", Value::number(50.0))])),
        );

        let result = result_with(results);
        assert_eq!(result.mean_field("quality"), Some(85.0));
        assert_eq!(result.mean_field("coverage"), Some(50.0));
        assert_eq!(result.mean_field("confidence"), None);
    }
}
