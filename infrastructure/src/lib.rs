//! Infrastructure layer for conductor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod bus;
pub mod channel;
pub mod config;
pub mod observability;
pub mod runtime;
pub mod sink;

// Re-export commonly used types
pub use bus::InMemoryEventBus;
pub use channel::{ScriptedChannel, ScriptedOutcome};
pub use config::{
    ConfigLoader, FileConfig, FileOrchestratorConfig, FileResolverConfig, FileSpecializationConfig,
};
pub use observability::TracingObserver;
pub use runtime::Runtime;
pub use sink::{JsonlPerformanceSink, MemoryPerformanceSink};
