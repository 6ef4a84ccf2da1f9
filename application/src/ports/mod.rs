//! Ports - interfaces to external collaborators
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod event_bus;
pub mod invocation;
pub mod observer;
pub mod performance_sink;
