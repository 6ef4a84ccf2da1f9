//! Invocation channel adapters

mod scripted;

pub use scripted::{ScriptedChannel, ScriptedOutcome};
