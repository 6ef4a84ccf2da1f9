//! Execution outcomes - per-capability results, consensus, learnings

pub mod entities;

pub use entities::{
    AspectConflict, AspectResolution, CapabilityOutcome, ConsensusResult, OrchestrationLearning,
    OrchestrationResult, StageTiming,
};
