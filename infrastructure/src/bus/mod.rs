//! Event bus adapters

mod memory;

pub use memory::InMemoryEventBus;
