//! Tool capability entities
//!
//! A [`ToolCapability`] describes an externally executed analysis or
//! generation function: what it is good at, what it depends on, and its
//! observed performance profile. Profiles are updated from outcomes and
//! never deleted.

use serde::{Deserialize, Serialize};

/// Observed performance profile of a capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    /// Average execution time in milliseconds
    pub average_time_ms: f64,
    /// Success rate in [0, 1]
    pub success_rate: f64,
    /// Quality score in [0, 100]
    pub quality_score: f64,
}

impl PerformanceProfile {
    pub fn new(average_time_ms: f64, success_rate: f64, quality_score: f64) -> Self {
        Self {
            average_time_ms,
            success_rate: success_rate.clamp(0.0, 1.0),
            quality_score: quality_score.clamp(0.0, 100.0),
        }
    }
}

impl Default for PerformanceProfile {
    fn default() -> Self {
        Self {
            average_time_ms: 500.0,
            success_rate: 0.9,
            quality_score: 80.0,
        }
    }
}

/// A named, externally executed capability
///
/// # Example
///
/// ```
/// use conductor_domain::{PerformanceProfile, ToolCapability};
///
/// let scanner = ToolCapability::new("security-scanner", PerformanceProfile::new(800.0, 0.92, 90.0))
///     .with_strengths(["vulnerability-detection", "owasp"])
///     .with_specializations(["vulnerability-detection"]);
/// assert_eq!(scanner.id, "security-scanner");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCapability {
    /// Capability identifier
    pub id: String,
    /// Tags describing what this capability does well
    pub strengths: Vec<String>,
    /// Tags describing known weak spots
    pub weaknesses: Vec<String>,
    /// Observed performance profile
    pub performance: PerformanceProfile,
    /// Specialization tags used for capability selection
    pub specializations: Vec<String>,
    /// Capabilities that must run before this one
    pub depends_on: Vec<String>,
}

impl ToolCapability {
    pub fn new(id: impl Into<String>, performance: PerformanceProfile) -> Self {
        Self {
            id: id.into(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            performance,
            specializations: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_strengths<I, S>(mut self, strengths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strengths = strengths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_weaknesses<I, S>(mut self, weaknesses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weaknesses = weaknesses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_specializations<I, S>(mut self, specializations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specializations = specializations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether any declared specialization matches one of the tags
    pub fn covers_any(&self, tags: &[String]) -> bool {
        self.specializations.iter().any(|s| tags.contains(s))
    }

    /// Fraction of this capability's strengths shared by `other`
    ///
    /// Used to pick fallback capabilities: a fallback must cover most of
    /// what the primary is good at.
    pub fn strength_overlap(&self, other: &ToolCapability) -> f64 {
        if self.strengths.is_empty() {
            return 0.0;
        }
        let shared = self
            .strengths
            .iter()
            .filter(|s| other.strengths.contains(s))
            .count();
        shared as f64 / self.strengths.len() as f64
    }
}

/// Built-in capability registry seed
///
/// The default set of analysis and generation capabilities the orchestrator
/// knows about before any runtime registration.
pub fn default_capabilities() -> Vec<ToolCapability> {
    vec![
        ToolCapability::new("code-reviewer", PerformanceProfile::new(600.0, 0.94, 92.0))
            .with_strengths(["code-review", "quality", "best-practices"])
            .with_weaknesses(["performance-profiling"])
            .with_specializations(["code-review", "pattern-detection"]),
        ToolCapability::new("metrics-analyzer", PerformanceProfile::new(400.0, 0.96, 85.0))
            .with_strengths(["metrics", "complexity", "maintainability"])
            .with_specializations(["metrics"]),
        ToolCapability::new("pattern-detector", PerformanceProfile::new(700.0, 0.9, 84.0))
            .with_strengths(["pattern-detection", "anti-patterns"])
            .with_specializations(["pattern-detection"]),
        ToolCapability::new("security-scanner", PerformanceProfile::new(900.0, 0.92, 93.0))
            .with_strengths(["vulnerability-detection", "owasp", "injection"])
            .with_weaknesses(["style"])
            .with_specializations(["vulnerability-detection"]),
        ToolCapability::new("dependency-auditor", PerformanceProfile::new(500.0, 0.95, 88.0))
            .with_strengths(["dependency-audit", "licensing"])
            .with_specializations(["dependency-audit"]),
        ToolCapability::new("test-generator", PerformanceProfile::new(1100.0, 0.88, 87.0))
            .with_strengths(["test-generation", "edge-cases"])
            .with_specializations(["test-generation"]),
        ToolCapability::new("coverage-analyzer", PerformanceProfile::new(450.0, 0.97, 86.0))
            .with_strengths(["coverage", "test-generation"])
            .with_specializations(["coverage"])
            .with_depends_on(["test-generator"]),
        ToolCapability::new("refactor-assistant", PerformanceProfile::new(800.0, 0.9, 89.0))
            .with_strengths(["refactoring", "code-review"])
            .with_specializations(["refactoring"]),
        ToolCapability::new("doc-writer", PerformanceProfile::new(650.0, 0.93, 82.0))
            .with_strengths(["documentation", "api"])
            .with_specializations(["documentation"]),
        ToolCapability::new("architecture-analyzer", PerformanceProfile::new(1200.0, 0.87, 90.0))
            .with_strengths(["architecture", "dependencies", "layering"])
            .with_specializations(["architecture"]),
    ]
}
