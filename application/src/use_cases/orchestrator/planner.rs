//! Task analysis and plan creation
//!
//! Planning selects capabilities by specialization tags, folds in tools that
//! history says keep working for this kind of task, honors caller
//! constraints, and groups the selection into dependency-ordered stages.

use super::history::history_key;
use super::{IntelligentOrchestrator, PlanningConstraint};
use crate::ports::invocation::InvocationChannel;
use crate::ports::performance_sink::{InputProfile, OutputProfile, PerformanceRecord};
use chrono::Utc;
use conductor_domain::{
    Backoff, ExecutionMode, ExecutionStage, OrchestrationPlan, OrchestrationTask, PlanAlternative,
    RetryStrategy, SpeedTarget, TaskComplexity, TaskType, ToolCapability,
};
use std::time::Instant;
use tracing::info;

/// Specialization tags consulted for each task type
fn type_tags(task_type: TaskType) -> &'static [&'static str] {
    match task_type {
        TaskType::Analysis => &["code-review", "metrics", "pattern-detection"],
        TaskType::Generation => &["test-generation", "documentation"],
        TaskType::Refactoring => &["refactoring", "code-review"],
        TaskType::Security => &["vulnerability-detection", "dependency-audit"],
        TaskType::Testing => &["test-generation", "coverage"],
    }
}

/// Capability count ceiling per complexity bucket
fn selection_cap(complexity: TaskComplexity) -> usize {
    match complexity {
        TaskComplexity::Simple => 1,
        TaskComplexity::Moderate => 3,
        TaskComplexity::Complex => usize::MAX,
    }
}

impl<C: InvocationChannel + 'static> IntelligentOrchestrator<C> {
    /// Analyze a task into a staged plan and register it as active
    ///
    /// A task no registered capability covers yields a zero-stage plan with
    /// zero confidence rather than an error.
    pub fn create_plan(
        &mut self,
        task: &OrchestrationTask,
        constraints: &[PlanningConstraint],
    ) -> OrchestrationPlan {
        let started = Instant::now();
        let complexity = TaskComplexity::classify(task);
        let mut reasoning = vec![format!(
            "classified {} task as {complexity:?} ({} chars of input)",
            task.task_type,
            task.input.size()
        )];

        let mut selected = self.select_capabilities(task, complexity, constraints, &mut reasoning);
        self.add_dependencies(&mut selected, &mut reasoning);

        let stages = self.build_stages(task, &selected);
        let estimated_time_ms = stages.iter().map(|s| s.timeout_ms).sum();
        let confidence = plan_confidence(&stages, &self.capabilities);
        reasoning.push(format!(
            "{} stage(s), estimated {estimated_time_ms:.0}ms, confidence {confidence:.2}",
            stages.len()
        ));

        let plan = OrchestrationPlan {
            id: self.next_plan_id(),
            task_type: task.task_type,
            requirements: task.requirements.clone(),
            alternatives: self.build_alternatives(task, &selected),
            stages,
            estimated_time_ms,
            confidence,
            reasoning,
        };

        info!(plan = %plan.id, stages = plan.stages.len(), confidence, "plan created");
        self.sink.record(PerformanceRecord {
            tool_id: "orchestrator".to_string(),
            operation: "create-plan".to_string(),
            timestamp: Utc::now(),
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            success: true,
            confidence,
            input: InputProfile {
                kind: task.task_type.to_string(),
                size: task.input.size(),
                complexity: Some(format!("{complexity:?}").to_lowercase()),
            },
            output: OutputProfile {
                kind: "plan".to_string(),
                size: plan.stages.len(),
                quality: None,
            },
        });

        self.active_plans.insert(plan.id.clone(), plan.clone());
        plan
    }

    /// Pick capabilities by tags, history and constraints, capped by complexity
    fn select_capabilities(
        &self,
        task: &OrchestrationTask,
        complexity: TaskComplexity,
        constraints: &[PlanningConstraint],
        reasoning: &mut Vec<String>,
    ) -> Vec<ToolCapability> {
        let tags: Vec<String> = type_tags(task.task_type)
            .iter()
            .map(|t| t.to_string())
            .collect();
        let mut candidates: Vec<ToolCapability> = self
            .capabilities
            .values()
            .filter(|c| c.covers_any(&tags))
            .cloned()
            .collect();
        if candidates.is_empty() {
            reasoning.push("no registered capability covers this task".to_string());
            return Vec::new();
        }

        // tools that keep succeeding for this kind of task join and lead
        let key = history_key(task.task_type, task.requirements.quality);
        let proven = self
            .history
            .frequent_successful_tools(&key, self.settings.success_pattern_threshold);
        if !proven.is_empty() {
            for id in &proven {
                if !candidates.iter().any(|c| &c.id == id)
                    && let Some(capability) = self.capabilities.get(id)
                {
                    candidates.push(capability.clone());
                }
            }
            reasoning.push(format!("history favors {}", proven.join(", ")));
            candidates.sort_by_key(|c| !proven.contains(&c.id));
        } else {
            candidates.sort_by(|a, b| {
                b.performance
                    .quality_score
                    .total_cmp(&a.performance.quality_score)
            });
        }

        let constrained = apply_constraints(&candidates, constraints, &self.settings);
        if constrained.is_empty() {
            reasoning.push("constraints excluded every candidate; ignoring them".to_string());
        } else {
            if constrained.len() < candidates.len() {
                reasoning.push(format!(
                    "constraints narrowed {} candidates to {}",
                    candidates.len(),
                    constrained.len()
                ));
            }
            candidates = constrained;
        }

        candidates.truncate(selection_cap(complexity));
        reasoning.push(format!(
            "selected {}",
            candidates
                .iter()
                .map(|c| c.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        candidates
    }

    /// Pull in declared dependencies of selected capabilities
    fn add_dependencies(&self, selected: &mut Vec<ToolCapability>, reasoning: &mut Vec<String>) {
        let ids: Vec<String> = selected.iter().map(|c| c.id.clone()).collect();
        for id in ids {
            let Some(capability) = self.capabilities.get(&id) else {
                continue;
            };
            for dep in capability.depends_on.clone() {
                if selected.iter().any(|c| c.id == dep) {
                    continue;
                }
                if let Some(dependency) = self.capabilities.get(&dep) {
                    reasoning.push(format!("added {dep}, required by {id}"));
                    selected.push(dependency.clone());
                }
            }
        }
    }

    /// Group the selection into stages, each seed joined by its dependents
    ///
    /// Grouping is one level deep: a capability lands in the group of the
    /// seed it directly depends on; longer chains fall into later groups.
    fn build_stages(
        &self,
        task: &OrchestrationTask,
        selected: &[ToolCapability],
    ) -> Vec<ExecutionStage> {
        let ids: Vec<&str> = selected.iter().map(|c| c.id.as_str()).collect();
        // seeds (nothing they depend on is selected) lead, dependents follow
        let (seeds, dependents): (Vec<&ToolCapability>, Vec<&ToolCapability>) =
            selected.iter().partition(|c| {
                c.depends_on
                    .iter()
                    .all(|dep| !ids.contains(&dep.as_str()))
            });

        let mut stages = Vec::new();
        let mut placed: Vec<&str> = Vec::new();
        for seed in seeds.iter().chain(dependents.iter()) {
            if placed.contains(&seed.id.as_str()) {
                continue;
            }
            placed.push(seed.id.as_str());
            let mut group = vec![*seed];
            for other in selected {
                if !placed.contains(&other.id.as_str()) && other.depends_on.contains(&seed.id) {
                    placed.push(other.id.as_str());
                    group.push(other);
                }
            }
            stages.push(self.build_stage(task, &group));
        }
        stages
    }

    fn build_stage(&self, task: &OrchestrationTask, group: &[&ToolCapability]) -> ExecutionStage {
        let intra_dependency = group.iter().any(|c| {
            c.depends_on
                .iter()
                .any(|dep| group.iter().any(|member| &member.id == dep))
        });
        let cross_check = task.requirements.quality.is_some_and(|q| q > 90.0);
        let mode = if group.len() <= 1 {
            ExecutionMode::Sequential
        } else if !intra_dependency {
            ExecutionMode::Parallel
        } else if cross_check {
            ExecutionMode::Consensus
        } else {
            ExecutionMode::Sequential
        };

        let factor = SpeedTarget::timeout_factor(task.requirements.speed);
        let timeout_ms: f64 = group
            .iter()
            .map(|c| c.performance.average_time_ms)
            .sum::<f64>()
            * factor;

        let high_quality = task.requirements.quality.is_some_and(|q| q > 80.0);
        let max_attempts = if high_quality { 3 } else { 2 };
        let mut retry = RetryStrategy::new(max_attempts, Backoff::Exponential);
        if let Some(fallback) = self.find_fallback(&group[0].id) {
            retry = retry.with_fallback(fallback);
        }

        ExecutionStage::new(
            group.iter().map(|c| c.id.clone()).collect(),
            mode,
            task.input.clone(),
        )
        .with_timeout_ms(timeout_ms)
        .with_retry(retry)
    }

    /// The best-overlapping substitute for a capability, if a close one exists
    fn find_fallback(&self, primary_id: &str) -> Option<String> {
        let primary = self.capabilities.get(primary_id)?;
        self.capabilities
            .values()
            .filter(|c| c.id != primary_id)
            .map(|c| (primary.strength_overlap(c), c))
            .filter(|(overlap, _)| *overlap > 0.5)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| c.id.clone())
    }

    /// Two alternative stagings with stated tradeoffs
    ///
    /// The fast variant keeps only the first two selected capabilities; the
    /// thorough variant widens the selection with up to two capabilities the
    /// plan left unused.
    fn build_alternatives(
        &self,
        task: &OrchestrationTask,
        selected: &[ToolCapability],
    ) -> Vec<PlanAlternative> {
        if selected.is_empty() {
            return Vec::new();
        }

        let fast_members: Vec<&ToolCapability> = selected.iter().take(2).collect();
        let fast_time: f64 = fast_members
            .iter()
            .map(|c| c.performance.average_time_ms)
            .sum();
        let fast = PlanAlternative {
            description: "only the two leading capabilities".to_string(),
            stages: vec![
                ExecutionStage::new(
                    fast_members.iter().map(|c| c.id.clone()).collect(),
                    if fast_members.len() > 1 {
                        ExecutionMode::Parallel
                    } else {
                        ExecutionMode::Sequential
                    },
                    task.input.clone(),
                )
                .with_timeout_ms(fast_time * 0.8),
            ],
            pros: vec!["fastest wall time".to_string()],
            cons: vec!["narrower coverage".to_string()],
        };

        let mut thorough_members: Vec<&ToolCapability> = selected.iter().collect();
        thorough_members.extend(
            self.capabilities
                .values()
                .filter(|c| !selected.iter().any(|s| s.id == c.id))
                .take(2),
        );
        let thorough_time: f64 = thorough_members
            .iter()
            .map(|c| c.performance.average_time_ms)
            .sum();
        let thorough = PlanAlternative {
            description: "widened with capabilities the plan left unused".to_string(),
            stages: vec![
                ExecutionStage::new(
                    thorough_members.iter().map(|c| c.id.clone()).collect(),
                    if thorough_members.len() > 1 {
                        ExecutionMode::Parallel
                    } else {
                        ExecutionMode::Sequential
                    },
                    task.input.clone(),
                )
                .with_timeout_ms(thorough_time * 2.0),
            ],
            pros: vec!["broadest coverage".to_string()],
            cons: vec!["slowest option".to_string()],
        };

        vec![fast, thorough]
    }
}

fn apply_constraints(
    candidates: &[ToolCapability],
    constraints: &[PlanningConstraint],
    settings: &super::OrchestratorSettings,
) -> Vec<ToolCapability> {
    candidates
        .iter()
        .filter(|c| {
            constraints.iter().all(|constraint| match constraint {
                PlanningConstraint::PreferFastTools => {
                    c.performance.average_time_ms <= settings.fast_tool_ceiling_ms
                }
                PlanningConstraint::RequireHighQualityTools => {
                    c.performance.quality_score >= settings.quality_floor
                }
            })
        })
        .cloned()
        .collect()
}

/// Mean over stages of the product of member success rates
fn plan_confidence(
    stages: &[ExecutionStage],
    registry: &std::collections::BTreeMap<String, ToolCapability>,
) -> f64 {
    if stages.is_empty() {
        return 0.0;
    }
    let per_stage: Vec<f64> = stages
        .iter()
        .map(|stage| {
            stage
                .capabilities
                .iter()
                .map(|id| {
                    registry
                        .get(id)
                        .map(|c| c.performance.success_rate)
                        .unwrap_or(0.5)
                })
                .product()
        })
        .collect();
    per_stage.iter().sum::<f64>() / per_stage.len() as f64
}
