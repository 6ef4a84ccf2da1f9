//! Application layer for conductor
//!
//! Ports define how the use cases talk to the outside world (capability
//! invocation, events, observability, performance tracking); the use cases
//! are the three coordinating components:
//!
//! - [`use_cases::orchestrator::IntelligentOrchestrator`] - plans and
//!   executes multi-stage capability workflows
//! - [`use_cases::conflict::ConflictResolver`] - settles disagreements
//!   between weighted positions
//! - [`use_cases::specialization::SpecializationSystem`] - assigns tasks and
//!   evolves per-tool competency profiles

pub mod ports;
pub mod use_cases;

pub use ports::event_bus::{EventBus, NoBus, ToolEvent};
pub use ports::invocation::{
    ChannelError, InvocationChannel, InvocationData, InvocationRequest, InvocationResponse,
};
pub use ports::observer::{LifecycleEvent, NoObserver, OrchestrationObserver};
pub use ports::performance_sink::{
    InputProfile, NoSink, OutputProfile, PerformanceRecord, PerformanceSink,
};
pub use use_cases::conflict::{ConflictResolver, MethodStats, ResolutionStatistics, ResolverSettings};
pub use use_cases::orchestrator::{
    IntelligentOrchestrator, OrchestrateError, OrchestratorSettings, PlanningConstraint,
};
pub use use_cases::specialization::{
    AssignError, ProfileReport, SpecializationSettings, SpecializationSystem, default_programs,
};
