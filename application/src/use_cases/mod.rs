//! Use cases - the coordinating components

pub mod conflict;
pub mod orchestrator;
pub mod specialization;
