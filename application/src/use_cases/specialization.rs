//! Specialization system use case
//!
//! Maintains per-tool skill and specialization profiles, scores candidates
//! against task requirements, assigns tasks, and feeds recorded outcomes
//! back into levels, skills, certifications and focus.

use crate::ports::observer::{LifecycleEvent, NoObserver, OrchestrationObserver};
use conductor_domain::specialization::domain_matches;
use conductor_domain::{
    AssignmentRequest, Certification, CertificationProgram, ComplexityTier, EvolutionEvent,
    EvolutionKind, PerformanceSample, TaskAssignment, TaskOutcome, ToolProfile,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by assignment and outcome recording
#[derive(Error, Debug)]
pub enum AssignError {
    #[error("No suitable candidate for domain '{0}'")]
    NoCandidate(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Tunable rates and thresholds
#[derive(Debug, Clone)]
pub struct SpecializationSettings {
    /// Scales level gain on success
    pub learning_rate: f64,
    /// Scales level loss on failure
    pub decay_rate: f64,
    /// Minimum match score a candidate must clear
    pub candidate_threshold: f64,
    /// Level lead over the primary focus that triggers a focus change
    pub focus_swap_margin: f64,
    /// Specialization level that qualifies a tool as a domain expert
    pub expert_level: f64,
}

impl Default for SpecializationSettings {
    fn default() -> Self {
        Self {
            learning_rate: 0.15,
            decay_rate: 0.05,
            candidate_threshold: 30.0,
            focus_swap_margin: 20.0,
            expert_level: 90.0,
        }
    }
}

/// Read-only summary of one profile
#[derive(Debug, Clone)]
pub struct ProfileReport {
    pub tool_id: String,
    pub primary_focus: String,
    pub average_level: f64,
    pub recent_performance: f64,
    /// Specialization name to (level, certification count)
    pub specializations: BTreeMap<String, (f64, usize)>,
    pub evolution_entries: usize,
}

/// Built-in certification programs
pub fn default_programs() -> Vec<CertificationProgram> {
    vec![
        CertificationProgram::new("foundation", "Foundation").requiring(10, 0.7),
        CertificationProgram::new("domain-specialist", "Domain Specialist").requiring(25, 0.85),
        CertificationProgram::new("master", "Master").requiring(50, 0.95),
    ]
}

/// Maintains tool profiles and assigns tasks by competency
pub struct SpecializationSystem {
    settings: SpecializationSettings,
    observer: Arc<dyn OrchestrationObserver>,
    profiles: BTreeMap<String, ToolProfile>,
    programs: Vec<CertificationProgram>,
    /// Domain to expert tool ids, rebuilt after every recorded outcome
    experts: BTreeMap<String, Vec<String>>,
    /// Active assignments per tool, feeding simulated availability
    active_assignments: BTreeMap<String, u32>,
}

impl Default for SpecializationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecializationSystem {
    pub fn new() -> Self {
        Self {
            settings: SpecializationSettings::default(),
            observer: Arc::new(NoObserver),
            profiles: BTreeMap::new(),
            programs: default_programs(),
            experts: BTreeMap::new(),
            active_assignments: BTreeMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: SpecializationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn OrchestrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_programs(mut self, programs: Vec<CertificationProgram>) -> Self {
        self.programs = programs;
        self
    }

    pub fn register_profile(&mut self, profile: ToolProfile) {
        self.profiles.insert(profile.tool_id.clone(), profile);
    }

    pub fn profile(&self, tool_id: &str) -> Option<&ToolProfile> {
        self.profiles.get(tool_id)
    }

    /// Expert tools for a domain (specialization level at or above the
    /// expert threshold)
    pub fn experts_in(&self, domain: &str) -> &[String] {
        self.experts.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Score every profile and assign the task to the best candidate
    ///
    /// Candidates must clear the match threshold; the final pick blends
    /// match 35%, estimated success 30%, recent performance 20% and
    /// availability 15%.
    pub fn assign_task(&mut self, request: &AssignmentRequest) -> Result<TaskAssignment, AssignError> {
        let mut best: Option<TaskAssignment> = None;
        for profile in self.profiles.values() {
            let match_score = self.calculate_match_score(profile, request);
            if match_score <= self.settings.candidate_threshold {
                continue;
            }

            let estimated_success = self.estimated_success(profile, &request.domain);
            let recent = profile.recent_performance();
            let availability = self.availability(&profile.tool_id);
            let score = match_score * 0.35
                + estimated_success * 0.30
                + recent * 0.20
                + availability * 0.15;

            debug!(
                tool = %profile.tool_id,
                match_score,
                estimated_success,
                availability,
                score,
                "scored candidate"
            );
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(TaskAssignment {
                    tool_id: profile.tool_id.clone(),
                    score,
                    match_score,
                    estimated_success,
                    availability,
                    rationale: format!(
                        "match {match_score:.0}, est. success {estimated_success:.0}, \
                         recent {recent:.0}, availability {availability:.0}"
                    ),
                });
            }
        }

        let assignment = best.ok_or_else(|| AssignError::NoCandidate(request.domain.clone()))?;
        *self
            .active_assignments
            .entry(assignment.tool_id.clone())
            .or_insert(0) += 1;
        info!(tool = %assignment.tool_id, domain = %request.domain, "task assigned");
        self.observer.on_event(&LifecycleEvent::TaskAssigned {
            tool_id: assignment.tool_id.clone(),
            domain: request.domain.clone(),
            score: assignment.score,
        });
        Ok(assignment)
    }

    /// Release one active assignment, restoring availability
    pub fn complete_assignment(&mut self, tool_id: &str) {
        if let Some(count) = self.active_assignments.get_mut(tool_id) {
            *count = count.saturating_sub(1);
        }
    }

    /// Feed one task outcome back into a tool's profile
    pub fn record_outcome(&mut self, tool_id: &str, outcome: &TaskOutcome) -> Result<(), AssignError> {
        let settings = self.settings.clone();
        let programs = self.programs.clone();
        let profile = self
            .profiles
            .get_mut(tool_id)
            .ok_or_else(|| AssignError::UnknownTool(tool_id.to_string()))?;

        profile.record_sample(PerformanceSample {
            domain: outcome.domain.clone(),
            score: outcome.score,
            success: outcome.success,
            timestamp: current_timestamp(),
        });

        let matching: Vec<String> = profile
            .matching_specializations(&outcome.domain)
            .into_iter()
            .map(String::from)
            .collect();
        for name in &matching {
            if let Some(spec) = profile.specializations.get_mut(name) {
                let level_before = spec.level;
                spec.apply_outcome(
                    outcome.score,
                    outcome.success,
                    settings.learning_rate,
                    settings.decay_rate,
                );
                if milestone(level_before) < milestone(spec.level) {
                    profile.evolution.push(EvolutionEvent::now(
                        EvolutionKind::LevelUp,
                        format!("{name} reached level {:.0}", spec.level),
                    ));
                }
            }
        }

        let earned = check_certifications(profile, &programs, &matching);
        for program in &earned {
            self.observer.on_event(&LifecycleEvent::CertificationAchieved {
                tool_id: tool_id.to_string(),
                program: program.clone(),
            });
        }

        self.check_focus_change(tool_id);
        self.rebuild_expert_index();

        self.observer.on_event(&LifecycleEvent::ProfileUpdated {
            tool_id: tool_id.to_string(),
            domain: outcome.domain.clone(),
        });
        Ok(())
    }

    /// Summarize a profile for callers that only need the headline numbers
    pub fn report(&self, tool_id: &str) -> Option<ProfileReport> {
        let profile = self.profiles.get(tool_id)?;
        Some(ProfileReport {
            tool_id: profile.tool_id.clone(),
            primary_focus: profile.primary_focus.clone(),
            average_level: profile.average_level(),
            recent_performance: profile.recent_performance(),
            specializations: profile
                .specializations
                .values()
                .map(|s| (s.name.clone(), (s.level, s.certifications.len())))
                .collect(),
            evolution_entries: profile.evolution.len(),
        })
    }

    /// Match score of one profile against a request
    ///
    /// Domain-matching specialization levels weigh 0.5 each, matching skill
    /// proficiencies 0.3, and each present preferred specialization adds 20.
    /// The sum is scaled by a complexity-handling factor and by recent
    /// performance.
    fn calculate_match_score(&self, profile: &ToolProfile, request: &AssignmentRequest) -> f64 {
        let mut score = 0.0;
        for spec in profile.specializations.values() {
            if domain_matches(&spec.name, &request.domain) {
                score += spec.level * 0.5;
            }
        }

        for required in &request.required_skills {
            for spec in profile.specializations.values() {
                for skill in &spec.skills {
                    if skill_matches(&skill.name, required) {
                        score += skill.proficiency * 0.3;
                    }
                }
            }
        }

        for preferred in &request.preferred_specializations {
            if profile.specializations.contains_key(preferred) {
                score += 20.0;
            }
        }

        score *= complexity_factor(profile.average_level(), request.complexity);
        score * profile.recent_performance() / 100.0
    }

    /// Estimated success chance in [0, 100] for the request domain
    fn estimated_success(&self, profile: &ToolProfile, domain: &str) -> f64 {
        let rates: Vec<f64> = profile
            .specializations
            .values()
            .filter(|s| domain_matches(&s.name, domain))
            .map(|s| s.success_rate)
            .collect();
        if rates.is_empty() {
            return 50.0;
        }
        rates.iter().sum::<f64>() / rates.len() as f64 * 100.0
    }

    /// Deterministic simulated availability from active assignment load
    fn availability(&self, tool_id: &str) -> f64 {
        let active = self.active_assignments.get(tool_id).copied().unwrap_or(0);
        (100.0 - 15.0 * active as f64).max(40.0)
    }

    /// Swap focus when a non-primary specialization pulls far enough ahead
    fn check_focus_change(&mut self, tool_id: &str) {
        let Some(profile) = self.profiles.get_mut(tool_id) else {
            return;
        };
        let primary_level = profile
            .specializations
            .get(&profile.primary_focus)
            .map(|s| s.level)
            .unwrap_or(0.0);
        let challenger = profile
            .specializations
            .values()
            .filter(|s| s.name != profile.primary_focus)
            .max_by(|a, b| a.level.total_cmp(&b.level));

        if let Some(challenger) = challenger {
            if challenger.level > primary_level + self.settings.focus_swap_margin {
                let new_focus = challenger.name.clone();
                profile.evolution.push(EvolutionEvent::now(
                    EvolutionKind::FocusChange,
                    format!(
                        "focus shifted from {} to {new_focus}",
                        profile.primary_focus
                    ),
                ));
                profile.secondary_focus = Some(profile.primary_focus.clone());
                profile.primary_focus = new_focus;
            }
        }
    }

    /// Rebuild the domain-to-experts index from scratch
    fn rebuild_expert_index(&mut self) {
        self.experts.clear();
        for profile in self.profiles.values() {
            for spec in profile.specializations.values() {
                if spec.level >= self.settings.expert_level {
                    self.experts
                        .entry(spec.name.clone())
                        .or_default()
                        .push(profile.tool_id.clone());
                }
            }
        }
    }
}

/// Award any newly satisfied certification; never re-awards
///
/// Returns the program ids newly awarded.
fn check_certifications(
    profile: &mut ToolProfile,
    programs: &[CertificationProgram],
    touched: &[String],
) -> Vec<String> {
    let mut earned = Vec::new();
    for name in touched {
        let skill_index: BTreeMap<String, f64> = profile
            .specializations
            .values()
            .flat_map(|s| s.skills.iter().map(|k| (k.name.clone(), k.proficiency)))
            .collect();
        let Some(spec) = profile.specializations.get_mut(name) else {
            continue;
        };
        for program in programs {
            if program
                .domain
                .as_ref()
                .is_some_and(|d| !domain_matches(&spec.name, d))
            {
                continue;
            }
            if spec.has_certification(&program.id) {
                continue;
            }
            if spec.experience < program.min_tasks || spec.success_rate < program.min_success_rate {
                continue;
            }
            let floors_met = program
                .skill_floors
                .iter()
                .all(|(skill, floor)| skill_index.get(skill).is_some_and(|p| p >= floor));
            if !floors_met {
                continue;
            }

            spec.certifications.push(Certification {
                program: program.id.clone(),
                name: program.name.clone(),
                earned_at: current_timestamp(),
            });
            profile.evolution.push(EvolutionEvent::now(
                EvolutionKind::Certification,
                format!("earned {} in {name}", program.name),
            ));
            earned.push(program.id.clone());
        }
    }
    earned
}

/// Discount factor for candidates below the level demanded by complexity
fn complexity_factor(average_level: f64, complexity: ComplexityTier) -> f64 {
    match complexity {
        ComplexityTier::Simple => 1.0,
        ComplexityTier::Moderate => {
            if average_level > 50.0 {
                1.0
            } else {
                0.8
            }
        }
        ComplexityTier::Complex => {
            if average_level > 70.0 {
                1.0
            } else {
                0.6
            }
        }
        ComplexityTier::Expert => {
            if average_level > 85.0 {
                1.0
            } else {
                0.4
            }
        }
    }
}

/// Loose skill-name match: either name contains the other
fn skill_matches(name: &str, wanted: &str) -> bool {
    let name = name.to_lowercase();
    let wanted = wanted.to_lowercase();
    name.contains(&wanted) || wanted.contains(&name)
}

/// Level milestones at 25/50/75/90 for the evolution log
fn milestone(level: f64) -> u8 {
    if level >= 90.0 {
        4
    } else if level >= 75.0 {
        3
    } else if level >= 50.0 {
        2
    } else if level >= 25.0 {
        1
    } else {
        0
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
