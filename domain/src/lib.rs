//! Domain layer for conductor
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Orchestration
//!
//! A task is analyzed into a staged plan over named capabilities; stages run
//! in parallel, sequentially, or under consensus reconciliation.
//!
//! ## Conflict
//!
//! When capabilities disagree, a conflict between weighted positions is
//! resolved by one of several methods (mediation, arbitration, voting, ...).
//!
//! ## Specialization
//!
//! Each tool carries a leveled competency profile that evolves from recorded
//! task outcomes and drives task assignment.

pub mod capability;
pub mod conflict;
pub mod core;
pub mod outcome;
pub mod plan;
pub mod specialization;
pub mod task;

// Re-export commonly used types
pub use capability::{PerformanceProfile, ToolCapability, default_capabilities};
pub use conflict::{
    Compromise, Conflict, ConflictContext, ConflictRequirements, ConflictSeverity, ConflictType,
    Dissent, Evidence, EvidenceKind, FollowUp, Position, Resolution, ResolutionMethod,
    calculate_agreement, find_middle_ground, score_evidence,
};
pub use core::{error::DomainError, value::Value};
pub use outcome::{
    AspectConflict, CapabilityOutcome, ConsensusResult, OrchestrationLearning,
    OrchestrationResult, StageTiming,
};
pub use plan::{
    Backoff, ExecutionMode, ExecutionStage, OrchestrationPlan, PlanAlternative, RetryStrategy,
};
pub use specialization::{
    AssignmentRequest, Certification, CertificationProgram, ComplexityTier, EvolutionEvent,
    EvolutionKind, LearningStyle, PerformanceSample, Skill, Specialization, TaskAssignment,
    TaskOutcome, ToolProfile,
};
pub use task::{
    AnalysisDepth, OrchestrationTask, SpeedTarget, TaskComplexity, TaskContext, TaskRequirements,
    TaskType,
};
