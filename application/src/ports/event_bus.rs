//! Insight/event channel port
//!
//! Inter-tool notifications flow over a minimal publish API. The orchestrator
//! reacts to `insight`, `tool-failure` and `consensus-needed`, and broadcasts
//! `fallback-activated` when it reroutes around a failing capability.

use conductor_domain::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An event on the inter-tool channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ToolEvent {
    /// High-confidence feedback about a capability's output quality
    Insight {
        capability: String,
        /// Confidence of the insight in [0, 1]
        confidence: f64,
        /// Observed quality signal in [0, 100]
        quality: f64,
    },
    /// A capability failed out-of-band
    ToolFailure { capability: String, error: String },
    /// A collaborator asks for a consensus over a set of results
    ConsensusNeeded { results: BTreeMap<String, Value> },
    /// The orchestrator substituted a fallback for a failing capability
    FallbackActivated { failed: String, fallback: String },
}

impl ToolEvent {
    /// The wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            ToolEvent::Insight { .. } => "insight",
            ToolEvent::ToolFailure { .. } => "tool-failure",
            ToolEvent::ConsensusNeeded { .. } => "consensus-needed",
            ToolEvent::FallbackActivated { .. } => "fallback-activated",
        }
    }
}

/// Port for publishing events to other tools
pub trait EventBus: Send + Sync {
    fn publish(&self, event: ToolEvent);
}

/// No-op event bus
pub struct NoBus;

impl EventBus for NoBus {
    fn publish(&self, _event: ToolEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let insight = ToolEvent::Insight {
            capability: "code-reviewer".to_string(),
            confidence: 0.9,
            quality: 95.0,
        };
        assert_eq!(insight.name(), "insight");

        let failure = ToolEvent::ToolFailure {
            capability: "security-scanner".to_string(),
            error: "crash".to_string(),
        };
        assert_eq!(failure.name(), "tool-failure");

        let consensus = ToolEvent::ConsensusNeeded {
            results: BTreeMap::new(),
        };
        assert_eq!(consensus.name(), "consensus-needed");

        let fallback = ToolEvent::FallbackActivated {
            failed: "a".to_string(),
            fallback: "b".to_string(),
        };
        assert_eq!(fallback.name(), "fallback-activated");
    }
}
