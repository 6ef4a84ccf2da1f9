//! Capability entities - externally executed tools and their profiles

pub mod entities;

pub use entities::{PerformanceProfile, ToolCapability, default_capabilities};
