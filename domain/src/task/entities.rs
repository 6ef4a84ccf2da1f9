//! Task entities - the input unit of orchestration
//!
//! An [`OrchestrationTask`] is immutable once submitted: a task type, an
//! opaque input payload, optional requirement targets and optional context
//! carried over from earlier work.

use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// Kind of work a task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Analysis,
    Generation,
    Refactoring,
    Security,
    Testing,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Analysis => "analysis",
            TaskType::Generation => "generation",
            TaskType::Refactoring => "refactoring",
            TaskType::Security => "security",
            TaskType::Testing => "testing",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speed target for plan timeout scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTarget {
    Fast,
    Balanced,
    Thorough,
}

impl SpeedTarget {
    /// Multiplier applied to summed capability times when budgeting a stage
    pub fn timeout_factor(target: Option<SpeedTarget>) -> f64 {
        match target {
            Some(SpeedTarget::Fast) => 0.8,
            Some(SpeedTarget::Balanced) => 1.2,
            Some(SpeedTarget::Thorough) => 2.0,
            None => 1.5,
        }
    }
}

/// Requested depth of analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Shallow,
    Standard,
    Deep,
}

/// Optional quality/speed/depth/confidence targets for a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRequirements {
    /// Minimum acceptable quality in [0, 100]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    /// Speed preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<SpeedTarget>,
    /// Requested depth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<AnalysisDepth>,
    /// Minimum acceptable confidence in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TaskRequirements {
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_speed(mut self, speed: SpeedTarget) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_depth(mut self, depth: AnalysisDepth) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Context carried into a task from the surrounding project or prior runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Results from earlier orchestrations relevant to this task
    #[serde(default)]
    pub previous_results: Vec<Value>,
}

/// Input unit of orchestration, immutable once submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationTask {
    pub task_type: TaskType,
    /// Opaque input payload
    pub input: Value,
    #[serde(default)]
    pub requirements: TaskRequirements,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<TaskContext>,
}

impl OrchestrationTask {
    pub fn new(task_type: TaskType, input: Value) -> Self {
        Self {
            task_type,
            input,
            requirements: TaskRequirements::default(),
            context: None,
        }
    }

    pub fn with_requirements(mut self, requirements: TaskRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Ordinal complexity bucket derived from input size and requirement strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Moderate,
    Complex,
}

impl TaskComplexity {
    /// Classify a task into a complexity bucket
    ///
    /// One point each for: input over 10k chars, input over 50k chars,
    /// quality target above 85, deep analysis requested, confidence target
    /// above 0.9, and more than three prior results in context.
    /// Score 0-1 is simple, 2-3 moderate, anything higher complex.
    pub fn classify(task: &OrchestrationTask) -> Self {
        let mut score = 0u32;
        let size = task.input.size();
        if size > 10_000 {
            score += 1;
        }
        if size > 50_000 {
            score += 1;
        }
        if task.requirements.quality.is_some_and(|q| q > 85.0) {
            score += 1;
        }
        if task.requirements.depth == Some(AnalysisDepth::Deep) {
            score += 1;
        }
        if task.requirements.confidence.is_some_and(|c| c > 0.9) {
            score += 1;
        }
        if task
            .context
            .as_ref()
            .is_some_and(|c| c.previous_results.len() > 3)
        {
            score += 1;
        }

        match score {
            0 | 1 => TaskComplexity::Simple,
            2 | 3 => TaskComplexity::Moderate,
            _ => TaskComplexity::Complex,
        }
    }
}
