//! Tool profile entities
//!
//! Each tool owns a [`ToolProfile`]: a mapping of specialization name to
//! leveled [`Specialization`], a focus, a bounded performance history and an
//! evolution log. Levels live in [0, 100] and are clamped on every update.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// How many recent performance samples a specialization keeps
pub const RECENT_WINDOW: usize = 10;

/// A named skill with a proficiency that moves with outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    /// Proficiency in [0, 100]
    pub proficiency: f64,
    /// How quickly proficiency moves per outcome
    pub improvement_rate: f64,
}

impl Skill {
    pub fn new(name: impl Into<String>, proficiency: f64) -> Self {
        Self {
            name: name.into(),
            proficiency: proficiency.clamp(0.0, 100.0),
            improvement_rate: 0.05,
        }
    }

    /// Raise proficiency after a successful outcome
    ///
    /// The improvement rate itself creeps up after high-scoring outcomes.
    pub fn improve(&mut self, score: f64) {
        self.proficiency = (self.proficiency + score * self.improvement_rate).clamp(0.0, 100.0);
        if score > 80.0 {
            self.improvement_rate = (self.improvement_rate * 1.05).min(0.5);
        }
    }

    /// Lower proficiency after a failed outcome
    pub fn degrade(&mut self) {
        self.proficiency = (self.proficiency - self.improvement_rate * 10.0).clamp(0.0, 100.0);
    }
}

/// A certification earned within a specialization; permanent once awarded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    /// Identifier of the program that awarded it
    pub program: String,
    pub name: String,
    /// Milliseconds since epoch at award time
    pub earned_at: u64,
}

/// Requirements a tool must satisfy to earn a certification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationProgram {
    pub id: String,
    pub name: String,
    /// Restrict the program to one domain; `None` applies to any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Minimum completed tasks in the specialization
    pub min_tasks: u32,
    /// Minimum rolling success rate in [0, 1]
    pub min_success_rate: f64,
    /// Named skill proficiency floors
    #[serde(default)]
    pub skill_floors: Vec<(String, f64)>,
}

impl CertificationProgram {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            domain: None,
            min_tasks: 10,
            min_success_rate: 0.7,
            skill_floors: Vec::new(),
        }
    }

    pub fn for_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn requiring(mut self, min_tasks: u32, min_success_rate: f64) -> Self {
        self.min_tasks = min_tasks;
        self.min_success_rate = min_success_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_skill_floor(mut self, skill: impl Into<String>, floor: f64) -> Self {
        self.skill_floors.push((skill.into(), floor));
        self
    }
}

/// A tool's leveled competency in one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialization {
    pub name: String,
    /// Level in [0, 100], clamped on every update
    pub level: f64,
    /// Total recorded outcomes
    pub experience: u32,
    /// Rolling success rate in [0, 1]
    pub success_rate: f64,
    /// Last recorded performance scores, newest last
    pub recent_performance: VecDeque<f64>,
    pub skills: Vec<Skill>,
    pub certifications: Vec<Certification>,
    /// Suggested steps toward the next milestone
    pub training_path: Vec<String>,
}

impl Specialization {
    pub fn new(name: impl Into<String>, level: f64) -> Self {
        let mut spec = Self {
            name: name.into(),
            level: level.clamp(0.0, 100.0),
            experience: 0,
            success_rate: 0.5,
            recent_performance: VecDeque::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            training_path: Vec::new(),
        };
        spec.rebuild_training_path();
        spec
    }

    pub fn with_skills(mut self, skills: Vec<Skill>) -> Self {
        self.skills = skills;
        self
    }

    /// Apply one outcome to this specialization
    ///
    /// Success moves the level up proportionally to remaining headroom;
    /// failure decays proportionally to the current level, so high levels
    /// pay larger penalties. The level stays in [0, 100] and is guarded
    /// against non-finite scores.
    pub fn apply_outcome(&mut self, score: f64, success: bool, learning_rate: f64, decay_rate: f64) {
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.experience += 1;

        if success {
            self.level += (score / 100.0) * learning_rate * (100.0 - self.level);
        } else {
            self.level -= decay_rate * self.level;
        }
        self.level = self.level.clamp(0.0, 100.0);

        let observed = if success { 1.0 } else { 0.0 };
        self.success_rate = self.success_rate * 0.9 + observed * 0.1;

        self.recent_performance.push_back(score);
        while self.recent_performance.len() > RECENT_WINDOW {
            self.recent_performance.pop_front();
        }

        for skill in &mut self.skills {
            if success {
                skill.improve(score);
            } else {
                skill.degrade();
            }
        }

        self.rebuild_training_path();
    }

    /// Whether a certification from the given program was already earned
    pub fn has_certification(&self, program_id: &str) -> bool {
        self.certifications.iter().any(|c| c.program == program_id)
    }

    fn rebuild_training_path(&mut self) {
        self.training_path = if self.level < 50.0 {
            vec![
                format!("practice {} tasks", self.name),
                "reach level 50".to_string(),
            ]
        } else if self.level < 90.0 {
            vec![
                format!("take on complex {} tasks", self.name),
                "reach level 90".to_string(),
            ]
        } else {
            vec!["maintain mastery".to_string()]
        };
    }
}

/// How a tool tends to acquire competency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    #[default]
    Adaptive,
    Methodical,
    Exploratory,
}

/// Kind of recorded profile evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvolutionKind {
    LevelUp,
    NewSkill,
    Certification,
    FocusChange,
}

/// One entry in a profile's evolution log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub kind: EvolutionKind,
    pub description: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
}

impl EvolutionEvent {
    pub fn now(kind: EvolutionKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            timestamp: current_timestamp(),
        }
    }
}

/// One recorded task outcome in a profile's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub domain: String,
    /// Score in [0, 100]
    pub score: f64,
    pub success: bool,
    pub timestamp: u64,
}

/// How many performance samples a profile keeps
pub const PROFILE_HISTORY_CAP: usize = 50;

/// Per-tool skill and specialization profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProfile {
    pub tool_id: String,
    /// Specialization name to specialization
    pub specializations: BTreeMap<String, Specialization>,
    pub primary_focus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_focus: Option<String>,
    #[serde(default)]
    pub learning_style: LearningStyle,
    /// Bounded outcome history, newest last
    pub performance_history: VecDeque<PerformanceSample>,
    /// Level-ups, new skills, certifications, focus changes
    pub evolution: Vec<EvolutionEvent>,
}

impl ToolProfile {
    pub fn new(tool_id: impl Into<String>, primary_focus: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            specializations: BTreeMap::new(),
            primary_focus: primary_focus.into(),
            secondary_focus: None,
            learning_style: LearningStyle::default(),
            performance_history: VecDeque::new(),
            evolution: Vec::new(),
        }
    }

    pub fn with_specialization(mut self, spec: Specialization) -> Self {
        self.specializations.insert(spec.name.clone(), spec);
        self
    }

    pub fn with_learning_style(mut self, style: LearningStyle) -> Self {
        self.learning_style = style;
        self
    }

    /// Mean level across all specializations, 0 when there are none
    pub fn average_level(&self) -> f64 {
        if self.specializations.is_empty() {
            return 0.0;
        }
        let total: f64 = self.specializations.values().map(|s| s.level).sum();
        total / self.specializations.len() as f64
    }

    /// Mean score over recorded history, defaulting to 75 with no samples
    pub fn recent_performance(&self) -> f64 {
        if self.performance_history.is_empty() {
            return 75.0;
        }
        let total: f64 = self.performance_history.iter().map(|s| s.score).sum();
        total / self.performance_history.len() as f64
    }

    /// Append a sample, evicting the oldest past the cap
    pub fn record_sample(&mut self, sample: PerformanceSample) {
        self.performance_history.push_back(sample);
        while self.performance_history.len() > PROFILE_HISTORY_CAP {
            self.performance_history.pop_front();
        }
    }

    /// Specializations whose name matches the given domain
    pub fn matching_specializations(&self, domain: &str) -> Vec<&str> {
        self.specializations
            .values()
            .filter(|s| domain_matches(&s.name, domain))
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// Loose domain match: equal, or one name contains the other
pub fn domain_matches(name: &str, domain: &str) -> bool {
    let name = name.to_lowercase();
    let domain = domain.to_lowercase();
    name == domain || name.contains(&domain) || domain.contains(&name)
}

/// Complexity a candidate must be able to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
    Expert,
}

/// What an assignment is looking for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub domain: String,
    pub complexity: ComplexityTier,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_specializations: Vec<String>,
}

impl AssignmentRequest {
    pub fn new(domain: impl Into<String>, complexity: ComplexityTier) -> Self {
        Self {
            domain: domain.into(),
            complexity,
            required_skills: Vec::new(),
            preferred_specializations: Vec::new(),
        }
    }

    pub fn with_required_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_preferred_specializations<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_specializations = specs.into_iter().map(Into::into).collect();
        self
    }
}

/// The chosen tool for a task, with the scores that selected it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub tool_id: String,
    /// Blended final score
    pub score: f64,
    pub match_score: f64,
    /// Estimated success chance in [0, 100]
    pub estimated_success: f64,
    /// Simulated availability in [0, 100]
    pub availability: f64,
    pub rationale: String,
}

/// One completed task fed back into a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub domain: String,
    /// Score in [0, 100]
    pub score: f64,
    pub success: bool,
    pub duration_ms: f64,
}

impl TaskOutcome {
    pub fn success(domain: impl Into<String>, score: f64) -> Self {
        Self {
            domain: domain.into(),
            score,
            success: true,
            duration_ms: 0.0,
        }
    }

    pub fn failure(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            score: 0.0,
            success: false,
            duration_ms: 0.0,
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_stays_in_bounds_under_repeated_outcomes() {
        let mut spec = Specialization::new("vulnerability-detection", 60.0);
        for _ in 0..500 {
            spec.apply_outcome(100.0, true, 0.15, 0.05);
        }
        assert!(spec.level <= 100.0);
        assert!(spec.level.is_finite());

        for _ in 0..500 {
            spec.apply_outcome(0.0, false, 0.15, 0.05);
        }
        assert!(spec.level >= 0.0);
        assert!(spec.level.is_finite());
    }

    #[test]
    fn test_level_guards_non_finite_scores() {
        let mut spec = Specialization::new("metrics", 50.0);
        spec.apply_outcome(f64::NAN, true, 0.15, 0.05);
        assert!(spec.level.is_finite());
        spec.apply_outcome(f64::INFINITY, true, 0.15, 0.05);
        assert!(spec.level.is_finite());
        assert!(spec.level <= 100.0);
    }

    #[test]
    fn test_failure_penalty_scales_with_level() {
        let mut high = Specialization::new("a", 90.0);
        let mut low = Specialization::new("b", 20.0);
        let high_before = high.level;
        let low_before = low.level;
        high.apply_outcome(0.0, false, 0.15, 0.05);
        low.apply_outcome(0.0, false, 0.15, 0.05);
        assert!((high_before - high.level) > (low_before - low.level));
    }

    #[test]
    fn test_recent_performance_window_bounded() {
        let mut spec = Specialization::new("coverage", 40.0);
        for i in 0..25 {
            spec.apply_outcome(i as f64, true, 0.15, 0.05);
        }
        assert_eq!(spec.recent_performance.len(), RECENT_WINDOW);
        // newest samples kept
        assert_eq!(spec.recent_performance.back().copied(), Some(24.0));
    }

    #[test]
    fn test_skill_improvement_rate_creeps_up_on_high_scores() {
        let mut skill = Skill::new("injection-analysis", 50.0);
        let rate_before = skill.improvement_rate;
        skill.improve(90.0);
        assert!(skill.improvement_rate > rate_before);

        let mut steady = Skill::new("style", 50.0);
        let rate_before = steady.improvement_rate;
        steady.improve(60.0);
        assert_eq!(steady.improvement_rate, rate_before);
    }

    #[test]
    fn test_profile_history_bounded() {
        let mut profile = ToolProfile::new("security-scanner", "vulnerability-detection");
        for i in 0..(PROFILE_HISTORY_CAP + 20) {
            profile.record_sample(PerformanceSample {
                domain: "security".to_string(),
                score: i as f64,
                success: true,
                timestamp: i as u64,
            });
        }
        assert_eq!(profile.performance_history.len(), PROFILE_HISTORY_CAP);
    }

    #[test]
    fn test_recent_performance_defaults_without_history() {
        let profile = ToolProfile::new("new-tool", "metrics");
        assert_eq!(profile.recent_performance(), 75.0);
    }

    #[test]
    fn test_domain_matches_loosely() {
        assert!(domain_matches("vulnerability-detection", "vulnerability-detection"));
        assert!(domain_matches("vulnerability-detection", "vulnerability"));
        assert!(domain_matches("security", "security-review"));
        assert!(!domain_matches("metrics", "documentation"));
    }

    #[test]
    fn test_training_path_follows_level() {
        let novice = Specialization::new("refactoring", 30.0);
        assert!(novice.training_path.iter().any(|s| s.contains("level 50")));

        let master = Specialization::new("refactoring", 95.0);
        assert_eq!(master.training_path, vec!["maintain mastery".to_string()]);
    }
}
