//! Wiring of configured use cases
//!
//! The host process builds its coordinating components here: file
//! configuration turns into settings, and the tracing observer is attached
//! so every lifecycle event reaches the logs.

use crate::config::FileConfig;
use crate::observability::TracingObserver;
use conductor_application::ports::invocation::InvocationChannel;
use conductor_application::use_cases::conflict::ConflictResolver;
use conductor_application::use_cases::orchestrator::IntelligentOrchestrator;
use conductor_application::use_cases::specialization::SpecializationSystem;
use std::sync::Arc;

/// Builds configured use cases sharing one observer
pub struct Runtime {
    config: FileConfig,
    observer: Arc<TracingObserver>,
}

impl Runtime {
    pub fn new(config: FileConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver::new()),
        }
    }

    /// An orchestrator over the given invocation channel
    pub fn orchestrator<C: InvocationChannel + 'static>(
        &self,
        channel: Arc<C>,
    ) -> IntelligentOrchestrator<C> {
        IntelligentOrchestrator::new(channel)
            .with_settings(self.config.orchestrator.clone().into_settings())
            .with_observer(self.observer.clone())
    }

    pub fn resolver(&self) -> ConflictResolver {
        ConflictResolver::new()
            .with_settings(self.config.resolver.clone().into_settings())
            .with_observer(self.observer.clone())
    }

    pub fn specialization(&self) -> SpecializationSystem {
        SpecializationSystem::new()
            .with_settings(self.config.specialization.clone().into_settings())
            .with_observer(self.observer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryEventBus;
    use crate::channel::{ScriptedChannel, ScriptedOutcome};
    use crate::sink::MemoryPerformanceSink;
    use conductor_domain::{
        AnalysisDepth, AssignmentRequest, ComplexityTier, Conflict, ConflictSeverity,
        ConflictType, Evidence, EvidenceKind, OrchestrationTask, Position, Skill, Specialization,
        TaskOutcome, TaskRequirements, TaskType, ToolProfile, Value,
    };

    fn quality_map(quality: f64) -> Value {
        Value::map([
            ("quality", Value::number(quality)),
            ("confidence", Value::number(0.9)),
        ])
    }

    #[tokio::test]
    async fn test_plan_and_execute_round_trip() {
        let channel = Arc::new(
            ScriptedChannel::new()
                .responding("code-reviewer", quality_map(92.0))
                .responding("metrics-analyzer", quality_map(88.0))
                .responding("pattern-detector", quality_map(84.0)),
        );
        let bus = Arc::new(InMemoryEventBus::new());
        let sink = Arc::new(MemoryPerformanceSink::new());
        let runtime = Runtime::new(FileConfig::default());
        let mut orchestrator = runtime
            .orchestrator(Arc::clone(&channel))
            .with_bus(Arc::clone(&bus) as _)
            .with_sink(Arc::clone(&sink) as _);

        let task = OrchestrationTask::new(TaskType::Analysis, Value::text("fn main() {}"))
            .with_requirements(TaskRequirements::default().with_quality(80.0));
        let plan = orchestrator.create_plan(&task, &[]);
        let result = orchestrator.execute(&plan.id).await.unwrap();

        assert!(result.success);
        assert!(!result.results.is_empty());
        assert_eq!(sink.records_for("create-plan").len(), 1);
        assert_eq!(sink.records_for("execute-plan").len(), 1);
        assert!(bus.is_empty());
    }

    #[tokio::test]
    async fn test_execution_survives_a_flaky_capability() {
        let channel = Arc::new(ScriptedChannel::new());
        // first call fails, retry succeeds
        channel.enqueue(
            "security-scanner",
            ScriptedOutcome::Unreachable("cold start".to_string()),
        );
        channel.set_sticky(
            "security-scanner",
            ScriptedOutcome::Respond(quality_map(93.0)),
        );
        channel.set_sticky(
            "dependency-auditor",
            ScriptedOutcome::Respond(quality_map(88.0)),
        );

        let mut config = FileConfig::default();
        config.orchestrator.retry_base_delay_ms = 1;
        let runtime = Runtime::new(config);
        let mut orchestrator = runtime.orchestrator(Arc::clone(&channel));

        let task = OrchestrationTask::new(TaskType::Security, Value::text("x".repeat(60_000)))
            .with_requirements(
                TaskRequirements::default()
                    .with_quality(85.0)
                    .with_depth(AnalysisDepth::Deep),
            );
        let plan = orchestrator.create_plan(&task, &[]);
        assert!(plan.stages[0].capabilities.len() > 1);

        let result = orchestrator.execute(&plan.id).await.unwrap();
        assert!(result.success);
        assert!(channel.requests_to("security-scanner") >= 2);
    }

    #[test]
    fn test_configured_resolver_settles_a_conflict() {
        let runtime = Runtime::new(FileConfig::default());
        let mut resolver = runtime.resolver();

        let conflict = Conflict::new(
            "c-1",
            "is the parser safe",
            ConflictType::Interpretation,
            vec![
                Position::new("security-scanner", Value::text("unsafe"), 0.9).with_evidence(vec![
                    Evidence::new("fuzzing crash", EvidenceKind::Empirical, 0.9).verifiable(),
                ]),
                Position::new("code-reviewer", Value::text("safe"), 0.6),
            ],
        )
        .with_domain("security")
        .with_severity(ConflictSeverity::Major);

        let resolution = resolver.resolve(&conflict);
        assert!(!resolution.explanation.is_empty());
        assert!(resolution.confidence > 0.0);
        assert_eq!(resolver.statistics().total, 1);
    }

    #[test]
    fn test_configured_specialization_assigns_and_learns() {
        let runtime = Runtime::new(FileConfig::default());
        let mut system = runtime.specialization();
        system.register_profile(
            ToolProfile::new("security-scanner", "security").with_specialization(
                Specialization::new("security", 80.0)
                    .with_skills(vec![Skill::new("security-analysis", 80.0)]),
            ),
        );

        let assignment = system
            .assign_task(&AssignmentRequest::new("security", ComplexityTier::Moderate))
            .unwrap();
        assert_eq!(assignment.tool_id, "security-scanner");

        system
            .record_outcome("security-scanner", &TaskOutcome::success("security", 95.0))
            .unwrap();
        let report = system.report("security-scanner").unwrap();
        assert!(report.average_level > 80.0);
    }
}
