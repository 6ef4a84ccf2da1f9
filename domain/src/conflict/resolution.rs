//! Resolution value objects
//!
//! A [`Resolution`] records how a conflict was settled: the method used, the
//! resulting outcome value, who dissented, and how strong the agreement was.

use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// Method used to resolve a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
    Mediation,
    Arbitration,
    Synthesis,
    Voting,
    EvidenceEvaluation,
    Compromise,
    Partition,
    Deferral,
    Escalation,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Mediation => "mediation",
            ResolutionMethod::Arbitration => "arbitration",
            ResolutionMethod::Synthesis => "synthesis",
            ResolutionMethod::Voting => "voting",
            ResolutionMethod::EvidenceEvaluation => "evidence-evaluation",
            ResolutionMethod::Compromise => "compromise",
            ResolutionMethod::Partition => "partition",
            ResolutionMethod::Deferral => "deferral",
            ResolutionMethod::Escalation => "escalation",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant whose position was not adopted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dissent {
    pub participant: String,
    pub reason: String,
    /// Whether the participant accepts the outcome despite disagreeing
    pub accepted: bool,
}

impl Dissent {
    pub fn accepted(participant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            reason: reason.into(),
            accepted: true,
        }
    }
}

/// A concession recorded while converging on an outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compromise {
    pub description: String,
    pub terms: Vec<String>,
}

/// A deferred action attached to an unresolved conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub action: String,
    pub assignee: String,
}

impl FollowUp {
    /// The orchestrator should revisit this conflict later
    pub fn revisit() -> Self {
        Self {
            action: "revisit-conflict".to_string(),
            assignee: "orchestrator".to_string(),
        }
    }

    /// A human must decide
    pub fn await_human() -> Self {
        Self {
            action: "await-human-decision".to_string(),
            assignee: "human".to_string(),
        }
    }
}

/// Structured record of how a conflict was settled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub conflict_id: String,
    pub method: ResolutionMethod,
    /// The adopted outcome; `None` for deferral and escalation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Value>,
    /// Explanation trail of how the outcome was reached
    pub explanation: Vec<String>,
    /// Agreement level in [0, 1]
    pub agreement_level: f64,
    #[serde(default)]
    pub dissent: Vec<Dissent>,
    #[serde(default)]
    pub compromises: Vec<Compromise>,
    /// Wall time spent resolving, in milliseconds
    pub duration_ms: f64,
    /// Confidence in the outcome, in [0, 1]
    pub confidence: f64,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
}

impl Resolution {
    pub fn new(method: ResolutionMethod) -> Self {
        Self {
            conflict_id: String::new(),
            method,
            outcome: None,
            explanation: Vec::new(),
            agreement_level: 0.0,
            dissent: Vec::new(),
            compromises: Vec::new(),
            duration_ms: 0.0,
            confidence: 0.0,
            follow_ups: Vec::new(),
        }
    }

    pub fn with_outcome(mut self, outcome: Value) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_agreement(mut self, agreement_level: f64) -> Self {
        self.agreement_level = agreement_level.clamp(0.0, 1.0);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn explain(mut self, line: impl Into<String>) -> Self {
        self.explanation.push(line.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(ResolutionMethod::EvidenceEvaluation.as_str(), "evidence-evaluation");
        assert_eq!(ResolutionMethod::Voting.to_string(), "voting");
    }

    #[test]
    fn test_follow_up_constructors() {
        let revisit = FollowUp::revisit();
        assert_eq!(revisit.action, "revisit-conflict");
        assert_eq!(revisit.assignee, "orchestrator");

        let human = FollowUp::await_human();
        assert_eq!(human.action, "await-human-decision");
        assert_eq!(human.assignee, "human");
    }

    #[test]
    fn test_resolution_builder_clamps() {
        let resolution = Resolution::new(ResolutionMethod::Voting)
            .with_agreement(1.3)
            .with_confidence(-0.1);
        assert_eq!(resolution.agreement_level, 1.0);
        assert_eq!(resolution.confidence, 0.0);
    }
}
