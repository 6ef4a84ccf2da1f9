//! Conflict entities
//!
//! A [`Conflict`] bundles the disagreeing [`Position`]s of several
//! participants together with severity, type and context. Conflicts are
//! transient: they exist only while being resolved.

use crate::core::value::Value;
use serde::{Deserialize, Serialize};

/// Severity tier of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

/// What kind of disagreement this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    /// Participants value different things
    ValueDisagreement,
    /// Participants read the same facts differently
    Interpretation,
    /// Participants favor different approaches
    Methodology,
    /// Participants rank goals differently
    Priority,
    /// Participants disagree on what is in scope
    Scope,
    /// Participants use a term differently
    Definition,
    /// Participants expect different outcomes
    Prediction,
}

/// Kind of evidence backing a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Empirical,
    Logical,
    Authoritative,
    Experiential,
}

impl EvidenceKind {
    /// Weight applied when scoring evidence of this kind
    pub fn weight(&self) -> f64 {
        match self {
            EvidenceKind::Empirical => 1.2,
            EvidenceKind::Logical => 1.0,
            EvidenceKind::Authoritative => 0.9,
            EvidenceKind::Experiential => 0.8,
        }
    }
}

/// A single piece of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub description: String,
    pub kind: EvidenceKind,
    /// Strength in [0, 1]
    pub strength: f64,
    /// Whether the evidence can be independently checked
    pub verifiable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Evidence {
    pub fn new(description: impl Into<String>, kind: EvidenceKind, strength: f64) -> Self {
        Self {
            description: description.into(),
            kind,
            strength: strength.clamp(0.0, 1.0),
            verifiable: false,
            source: None,
        }
    }

    pub fn verifiable(mut self) -> Self {
        self.verifiable = true;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// One participant's stance in a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub participant: String,
    /// The stance value itself; arbitrary shape
    pub stance: Value,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Supporting rationale strings
    #[serde(default)]
    pub rationale: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    /// Willingness to move, in [0, 1]
    pub flexibility: f64,
}

impl Position {
    pub fn new(participant: impl Into<String>, stance: Value, confidence: f64) -> Self {
        Self {
            participant: participant.into(),
            stance,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: Vec::new(),
            evidence: Vec::new(),
            flexibility: 0.5,
        }
    }

    pub fn with_rationale<I, S>(mut self, rationale: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rationale = rationale.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<Evidence>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_flexibility(mut self, flexibility: f64) -> Self {
        self.flexibility = flexibility.clamp(0.0, 1.0);
        self
    }
}

/// Constraints attached to a conflict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictRequirements {
    /// Whether this conflict may be put off instead of resolved now
    #[serde(default)]
    pub can_defer: bool,
}

/// Context surrounding a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictContext {
    /// Importance in [0, 1]
    pub importance: f64,
    /// Time available for resolution, if constrained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_constraint_ms: Option<u64>,
    #[serde(default)]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub requirements: ConflictRequirements,
}

impl Default for ConflictContext {
    fn default() -> Self {
        Self {
            importance: 0.5,
            time_constraint_ms: None,
            stakeholders: Vec::new(),
            requirements: ConflictRequirements::default(),
        }
    }
}

/// A disagreement between participants' positions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub id: String,
    pub topic: String,
    pub domain: String,
    pub positions: Vec<Position>,
    pub severity: ConflictSeverity,
    pub conflict_type: ConflictType,
    #[serde(default)]
    pub context: ConflictContext,
}

impl Conflict {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        conflict_type: ConflictType,
        positions: Vec<Position>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            domain: String::new(),
            positions,
            severity: ConflictSeverity::Moderate,
            conflict_type,
            context: ConflictContext::default(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_severity(mut self, severity: ConflictSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_context(mut self, context: ConflictContext) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_kind_weights() {
        assert_eq!(EvidenceKind::Empirical.weight(), 1.2);
        assert_eq!(EvidenceKind::Logical.weight(), 1.0);
        assert_eq!(EvidenceKind::Authoritative.weight(), 0.9);
        assert_eq!(EvidenceKind::Experiential.weight(), 0.8);
    }

    #[test]
    fn test_position_clamps_confidence_and_flexibility() {
        let position = Position::new("reviewer", Value::number(1.0), 1.4).with_flexibility(-0.2);
        assert_eq!(position.confidence, 1.0);
        assert_eq!(position.flexibility, 0.0);
    }

    #[test]
    fn test_evidence_strength_clamped() {
        let evidence = Evidence::new("benchmark run", EvidenceKind::Empirical, 2.0);
        assert_eq!(evidence.strength, 1.0);
    }
}
