//! Execution plans - staged capability schedules derived from a task

pub mod entities;

pub use entities::{
    Backoff, ExecutionMode, ExecutionStage, OrchestrationPlan, PlanAlternative, RetryStrategy,
};
