//! Orchestration task types and complexity classification

pub mod entities;

pub use entities::{
    AnalysisDepth, OrchestrationTask, SpeedTarget, TaskComplexity, TaskContext, TaskRequirements,
    TaskType,
};
