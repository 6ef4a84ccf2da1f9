//! Specialization entities - leveled tool competency profiles

pub mod entities;

pub use entities::{
    AssignmentRequest, Certification, CertificationProgram, ComplexityTier, EvolutionEvent,
    EvolutionKind, LearningStyle, PerformanceSample, Skill, Specialization, TaskAssignment,
    TaskOutcome, ToolProfile, domain_matches,
};
