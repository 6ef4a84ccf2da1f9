//! Performance sink adapters

mod jsonl;
mod memory;

pub use jsonl::JsonlPerformanceSink;
pub use memory::MemoryPerformanceSink;
