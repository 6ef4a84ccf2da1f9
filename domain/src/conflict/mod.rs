//! Conflict entities and resolution value objects

pub mod entities;
pub mod resolution;
pub mod scoring;

pub use entities::{
    Conflict, ConflictContext, ConflictRequirements, ConflictSeverity, ConflictType, Evidence,
    EvidenceKind, Position,
};
pub use resolution::{Compromise, Dissent, FollowUp, Resolution, ResolutionMethod};
pub use scoring::{calculate_agreement, find_middle_ground, score_evidence};
