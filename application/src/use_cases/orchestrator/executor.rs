//! Plan execution
//!
//! Stages run in order; members run concurrently, sequentially or under
//! consensus reconciliation depending on the stage mode. Individual failures
//! become inline error markers after retries and fallback are exhausted; the
//! run only aborts when a consensus stage loses every member, and one
//! recovery attempt over the plan's first alternative follows before the
//! error reaches the caller.

use super::consensus::build_consensus;
use super::history::{HistoryEntry, history_key};
use super::{IntelligentOrchestrator, OrchestrateError};
use crate::ports::event_bus::ToolEvent;
use crate::ports::invocation::{ChannelError, InvocationChannel, InvocationRequest};
use crate::ports::observer::LifecycleEvent;
use crate::ports::performance_sink::{InputProfile, OutputProfile, PerformanceRecord};
use chrono::Utc;
use conductor_domain::{
    CapabilityOutcome, ConsensusResult, ExecutionMode, ExecutionStage, OrchestrationLearning,
    OrchestrationPlan, OrchestrationResult, RetryStrategy, StageTiming, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Accumulated products of running a plan's stages
struct RunOutcome {
    results: BTreeMap<String, CapabilityOutcome>,
    consensus: Option<ConsensusResult>,
    stage_timings: Vec<StageTiming>,
    tool_durations_ms: BTreeMap<String, f64>,
}

impl<C: InvocationChannel + 'static> IntelligentOrchestrator<C> {
    /// Execute a previously created plan
    ///
    /// A stage-level collapse triggers one recovery attempt over the plan's
    /// first alternative before the error is surfaced.
    pub async fn execute(&mut self, plan_id: &str) -> Result<OrchestrationResult, OrchestrateError> {
        let plan = self
            .active_plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| OrchestrateError::UnknownPlan(plan_id.to_string()))?;

        self.observer.on_event(&LifecycleEvent::OrchestrationStart {
            plan_id: plan.id.clone(),
            stages: plan.stages.len(),
        });
        let started = Instant::now();

        let outcome = match self.run_stages(&plan).await {
            Ok(outcome) => outcome,
            Err(error) => match plan.alternatives.first() {
                Some(alternative) => {
                    warn!(plan = %plan.id, %error, "stage collapse, attempting recovery");
                    self.observer.on_event(&LifecycleEvent::OrchestrationRecovery {
                        plan_id: plan.id.clone(),
                        error: error.to_string(),
                    });
                    let mut recovery = plan.clone();
                    recovery.stages = alternative.stages.clone();
                    match self.run_stages(&recovery).await {
                        Ok(outcome) => outcome,
                        Err(error) => return self.fail_run(&plan, started, error),
                    }
                }
                None => return self.fail_run(&plan, started, error),
            },
        };

        let total_ms = started.elapsed().as_secs_f64() * 1000.0;
        let result = self.assemble_result(&plan, outcome, total_ms);

        self.history.record(
            &history_key(plan.task_type, plan.requirements.quality),
            HistoryEntry {
                tools: plan.capability_ids().iter().map(|s| s.to_string()).collect(),
                success: result.success,
                duration_ms: total_ms,
            },
            self.settings.history_cap,
        );
        self.record_execution(&plan, &result, total_ms);
        self.observer.on_event(&LifecycleEvent::OrchestrationComplete {
            plan_id: plan.id.clone(),
            success: result.success,
        });
        info!(plan = %plan.id, success = result.success, total_ms, "orchestration finished");
        Ok(result)
    }

    /// Run every stage of a plan, threading results forward as context
    async fn run_stages(&self, plan: &OrchestrationPlan) -> Result<RunOutcome, OrchestrateError> {
        let mut results: BTreeMap<String, CapabilityOutcome> = BTreeMap::new();
        let mut context: BTreeMap<String, Value> = BTreeMap::new();
        let mut stage_timings = Vec::new();
        let mut tool_durations_ms = BTreeMap::new();
        let mut consensus = None;

        for (index, stage) in plan.stages.iter().enumerate() {
            self.observer.on_event(&LifecycleEvent::StageStart {
                plan_id: plan.id.clone(),
                stage: index,
                mode: stage.mode,
            });
            let stage_started = Instant::now();
            let mut agreement = None;

            match stage.mode {
                ExecutionMode::Parallel => {
                    self.run_parallel(stage, &mut results, &mut context, &mut tool_durations_ms)
                        .await;
                }
                ExecutionMode::Sequential => {
                    self.run_sequential(stage, &mut results, &mut context, &mut tool_durations_ms)
                        .await;
                }
                ExecutionMode::Consensus => {
                    let stage_consensus = self
                        .run_consensus(
                            stage,
                            index,
                            &mut results,
                            &mut context,
                            &mut tool_durations_ms,
                        )
                        .await?;
                    agreement = Some(stage_consensus.agreement_level);
                    consensus = Some(stage_consensus);
                }
            }

            let duration_ms = stage_started.elapsed().as_secs_f64() * 1000.0;
            stage_timings.push(StageTiming {
                stage: index,
                mode: stage.mode,
                duration_ms,
                timeout_ms: stage.timeout_ms,
                agreement,
            });
            self.observer.on_event(&LifecycleEvent::StageComplete {
                plan_id: plan.id.clone(),
                stage: index,
                duration_ms,
            });
        }

        // a consensus stage anywhere means one more reconciliation at the
        // end, this time over everything the run accumulated
        if consensus.is_some() {
            let accumulated: BTreeMap<String, CapabilityOutcome> = results
                .iter()
                .filter(|(id, _)| id.as_str() != "consensus")
                .map(|(id, outcome)| (id.clone(), outcome.clone()))
                .collect();
            consensus = Some(build_consensus(&accumulated, &self.capabilities));
        }

        Ok(RunOutcome {
            results,
            consensus,
            stage_timings,
            tool_durations_ms,
        })
    }

    async fn run_parallel(
        &self,
        stage: &ExecutionStage,
        results: &mut BTreeMap<String, CapabilityOutcome>,
        context: &mut BTreeMap<String, Value>,
        durations: &mut BTreeMap<String, f64>,
    ) {
        let mut set = JoinSet::new();
        for capability in &stage.capabilities {
            let channel = Arc::clone(&self.channel);
            let capability = capability.clone();
            let input = stage.input.clone();
            let snapshot = context.clone();
            let retry = stage.retry.clone();
            let base = self.settings.retry_base_delay_ms;
            set.spawn(async move {
                let started = Instant::now();
                let outcome =
                    invoke_with_retry(channel.as_ref(), &capability, &input, &snapshot, &retry, base)
                        .await;
                (capability, outcome, started.elapsed().as_secs_f64() * 1000.0)
            });
        }

        while let Some(joined) = set.join_next().await {
            let Ok((capability, invoked, duration_ms)) = joined else {
                warn!("parallel invocation task aborted");
                continue;
            };
            durations.insert(capability.clone(), duration_ms);
            let outcome = match invoked {
                Ok(value) => CapabilityOutcome::success(value),
                Err(error) => self.settle_failure(&capability, error, stage, context).await,
            };
            if let Some(value) = outcome.value() {
                context.insert(capability.clone(), value.clone());
            }
            results.insert(capability, outcome);
        }
    }

    async fn run_sequential(
        &self,
        stage: &ExecutionStage,
        results: &mut BTreeMap<String, CapabilityOutcome>,
        context: &mut BTreeMap<String, Value>,
        durations: &mut BTreeMap<String, f64>,
    ) {
        for capability in &stage.capabilities {
            let started = Instant::now();
            let invoked = invoke_with_retry(
                self.channel.as_ref(),
                capability,
                &stage.input,
                context,
                &stage.retry,
                self.settings.retry_base_delay_ms,
            )
            .await;
            durations.insert(capability.clone(), started.elapsed().as_secs_f64() * 1000.0);

            let outcome = match invoked {
                Ok(value) => CapabilityOutcome::success(value),
                Err(error) => self.settle_failure(capability, error, stage, context).await,
            };
            if let Some(value) = outcome.value() {
                context.insert(capability.clone(), value.clone());
            }
            results.insert(capability.clone(), outcome);
        }
    }

    /// Invoke every member, then reconcile their results
    ///
    /// Fails the run only when no member produced anything to reconcile.
    async fn run_consensus(
        &self,
        stage: &ExecutionStage,
        index: usize,
        results: &mut BTreeMap<String, CapabilityOutcome>,
        context: &mut BTreeMap<String, Value>,
        durations: &mut BTreeMap<String, f64>,
    ) -> Result<ConsensusResult, OrchestrateError> {
        let mut members: BTreeMap<String, CapabilityOutcome> = BTreeMap::new();
        for capability in &stage.capabilities {
            let started = Instant::now();
            let invoked = invoke_with_retry(
                self.channel.as_ref(),
                capability,
                &stage.input,
                context,
                &stage.retry,
                self.settings.retry_base_delay_ms,
            )
            .await;
            durations.insert(capability.clone(), started.elapsed().as_secs_f64() * 1000.0);

            let outcome = match invoked {
                Ok(value) => CapabilityOutcome::success(value),
                Err(error) => self.settle_failure(capability, error, stage, context).await,
            };
            members.insert(capability.clone(), outcome);
        }

        if members.values().all(CapabilityOutcome::is_error) {
            return Err(OrchestrateError::StageFailed {
                stage: index,
                reason: "every consensus member failed".to_string(),
            });
        }

        let consensus = build_consensus(&members, &self.capabilities);
        let agreed = Value::Map(consensus.outcome.clone());
        context.insert("consensus".to_string(), agreed.clone());
        results.append(&mut members);
        results.insert("consensus".to_string(), CapabilityOutcome::success(agreed));
        Ok(consensus)
    }

    /// Last resort after retries: try the stage's fallback once
    async fn settle_failure(
        &self,
        capability: &str,
        error: ChannelError,
        stage: &ExecutionStage,
        context: &BTreeMap<String, Value>,
    ) -> CapabilityOutcome {
        if let Some(fallback) = stage.retry.fallback.as_deref() {
            if fallback != capability {
                let request =
                    InvocationRequest::execute(fallback, stage.input.clone(), context.clone());
                if let Ok(response) = self.channel.request(request).await {
                    if let Some(value) = response.data {
                        self.bus.publish(ToolEvent::FallbackActivated {
                            failed: capability.to_string(),
                            fallback: fallback.to_string(),
                        });
                        info!(capability, fallback, "fallback substituted");
                        return CapabilityOutcome::success(value);
                    }
                }
            }
        }

        warn!(capability, %error, "capability failed after retries");
        self.bus.publish(ToolEvent::ToolFailure {
            capability: capability.to_string(),
            error: error.to_string(),
        });
        CapabilityOutcome::failed(error.to_string())
    }

    fn assemble_result(
        &self,
        plan: &OrchestrationPlan,
        outcome: RunOutcome,
        total_ms: f64,
    ) -> OrchestrationResult {
        let mut result = OrchestrationResult {
            plan_id: plan.id.clone(),
            success: false,
            results: outcome.results,
            consensus: outcome.consensus,
            stage_timings: outcome.stage_timings,
            tool_durations_ms: outcome.tool_durations_ms,
            learnings: Vec::new(),
            explanation: String::new(),
        };

        let mut success = !result.has_errors();
        if let Some(target) = plan.requirements.quality {
            if let Some(quality) = result.mean_field("quality") {
                success = success && quality >= target;
            }
        }
        if let Some(target) = plan.requirements.confidence {
            if let Some(confidence) = result.mean_field("confidence") {
                success = success && confidence >= target;
            }
        }
        result.success = success;
        result.learnings = derive_learnings(&result.stage_timings);
        result.explanation = explain(plan, &result, total_ms);
        result
    }

    fn fail_run(
        &mut self,
        plan: &OrchestrationPlan,
        started: Instant,
        error: OrchestrateError,
    ) -> Result<OrchestrationResult, OrchestrateError> {
        let total_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.history.record(
            &history_key(plan.task_type, plan.requirements.quality),
            HistoryEntry {
                tools: plan.capability_ids().iter().map(|s| s.to_string()).collect(),
                success: false,
                duration_ms: total_ms,
            },
            self.settings.history_cap,
        );
        self.observer.on_event(&LifecycleEvent::OrchestrationComplete {
            plan_id: plan.id.clone(),
            success: false,
        });
        Err(error)
    }

    fn record_execution(&self, plan: &OrchestrationPlan, result: &OrchestrationResult, total_ms: f64) {
        self.sink.record(PerformanceRecord {
            tool_id: "orchestrator".to_string(),
            operation: "execute-plan".to_string(),
            timestamp: Utc::now(),
            duration_ms: total_ms,
            success: result.success,
            confidence: plan.confidence,
            input: InputProfile {
                kind: plan.task_type.to_string(),
                size: plan.stages.first().map(|s| s.input.size()).unwrap_or(0),
                complexity: None,
            },
            output: OutputProfile {
                kind: "result".to_string(),
                size: result.results.len(),
                quality: result.mean_field("quality"),
            },
        });
    }
}

/// Invoke one capability, retrying per the stage policy
///
/// An empty response payload counts as a failure, whatever the transport
/// said.
async fn invoke_with_retry<C: InvocationChannel>(
    channel: &C,
    capability: &str,
    input: &Value,
    context: &BTreeMap<String, Value>,
    retry: &RetryStrategy,
    base_delay_ms: u64,
) -> Result<Value, ChannelError> {
    let mut last = ChannelError::EmptyResponse(capability.to_string());
    for attempt in 0..retry.max_attempts {
        if attempt > 0 {
            let delay = retry.backoff.delay_ms(attempt, base_delay_ms);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let request = InvocationRequest::execute(capability, input.clone(), context.clone());
        match channel.request(request).await {
            Ok(response) => match response.data {
                Some(value) => return Ok(value),
                None => last = ChannelError::EmptyResponse(capability.to_string()),
            },
            Err(error) => last = error,
        }
    }
    Err(last)
}

/// One retrospective observation per stage, first matching rule wins
fn derive_learnings(timings: &[StageTiming]) -> Vec<OrchestrationLearning> {
    timings
        .iter()
        .filter_map(|timing| {
            if timing.timeout_ms > 0.0 && timing.duration_ms > timing.timeout_ms {
                Some(OrchestrationLearning::negative(
                    timing.stage,
                    "slow-execution",
                    format!(
                        "stage took {:.0}ms against a {:.0}ms budget",
                        timing.duration_ms, timing.timeout_ms
                    ),
                ))
            } else if timing.agreement.is_some_and(|a| a < 0.5) {
                Some(OrchestrationLearning::negative(
                    timing.stage,
                    "low-agreement",
                    "capabilities disagreed on most aspects".to_string(),
                ))
            } else if timing.mode == ExecutionMode::Parallel
                && timing.timeout_ms > 0.0
                && timing.duration_ms < timing.timeout_ms * 0.5
            {
                Some(OrchestrationLearning::positive(
                    timing.stage,
                    "efficient-parallel",
                    "parallel stage finished well under budget".to_string(),
                ))
            } else {
                None
            }
        })
        .collect()
}

fn explain(plan: &OrchestrationPlan, result: &OrchestrationResult, total_ms: f64) -> String {
    let failed = result.results.values().filter(|r| r.is_error()).count();
    let mut explanation = format!(
        "Executed {} of plan {}'s stage(s) in {total_ms:.0}ms; {} of {} result(s) failed.",
        result.stage_timings.len(),
        plan.id,
        failed,
        result.results.len()
    );
    if let Some(consensus) = &result.consensus {
        explanation.push_str(&format!(
            " Consensus reached {:.0}% agreement across {} aspect(s).",
            consensus.agreement_level * 100.0,
            consensus.outcome.len()
        ));
    }
    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::event_bus::EventBus;
    use crate::ports::invocation::InvocationResponse;
    use crate::ports::observer::OrchestrationObserver;
    use async_trait::async_trait;
    use conductor_domain::{Backoff, TaskRequirements, TaskType};
    use std::sync::Mutex;

    type Script = Box<dyn Fn(u32) -> Result<InvocationResponse, ChannelError> + Send + Sync>;

    /// Channel answering from per-capability scripts keyed by call count
    struct ScriptChannel {
        scripts: BTreeMap<String, Script>,
        calls: Mutex<Vec<InvocationRequest>>,
        counts: Mutex<BTreeMap<String, u32>>,
    }

    impl ScriptChannel {
        fn new() -> Self {
            Self {
                scripts: BTreeMap::new(),
                calls: Mutex::new(Vec::new()),
                counts: Mutex::new(BTreeMap::new()),
            }
        }

        fn on<F>(mut self, capability: &str, script: F) -> Self
        where
            F: Fn(u32) -> Result<InvocationResponse, ChannelError> + Send + Sync + 'static,
        {
            self.scripts.insert(capability.to_string(), Box::new(script));
            self
        }

        fn always(self, capability: &str, value: Value) -> Self {
            self.on(capability, move |_| Ok(InvocationResponse::with_data(value.clone())))
        }

        fn calls_to(&self, capability: &str) -> u32 {
            self.counts
                .lock()
                .unwrap()
                .get(capability)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl InvocationChannel for ScriptChannel {
        async fn request(
            &self,
            request: InvocationRequest,
        ) -> Result<InvocationResponse, ChannelError> {
            let attempt = {
                let mut counts = self.counts.lock().unwrap();
                let entry = counts.entry(request.to.clone()).or_insert(0);
                *entry += 1;
                *entry - 1
            };
            let capability = request.to.clone();
            self.calls.lock().unwrap().push(request);
            match self.scripts.get(&capability) {
                Some(script) => script(attempt),
                None => Err(ChannelError::Transport {
                    capability,
                    reason: "unscripted".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingBus {
        events: Mutex<Vec<String>>,
    }

    impl EventBus for RecordingBus {
        fn publish(&self, event: ToolEvent) {
            self.events.lock().unwrap().push(event.name().to_string());
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl OrchestrationObserver for RecordingObserver {
        fn on_event(&self, event: &LifecycleEvent) {
            self.events.lock().unwrap().push(event.name().to_string());
        }
    }

    fn quality_map(quality: f64) -> Value {
        Value::map([("quality", Value::number(quality))])
    }

    fn plan_with(stages: Vec<ExecutionStage>) -> OrchestrationPlan {
        OrchestrationPlan {
            id: "plan-test".to_string(),
            task_type: TaskType::Analysis,
            requirements: TaskRequirements::default(),
            stages,
            estimated_time_ms: 1000.0,
            confidence: 0.9,
            reasoning: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    fn fast_settings() -> super::super::OrchestratorSettings {
        super::super::OrchestratorSettings {
            retry_base_delay_ms: 1,
            ..Default::default()
        }
    }

    fn orchestrator_with(
        channel: Arc<ScriptChannel>,
        plan: OrchestrationPlan,
    ) -> IntelligentOrchestrator<ScriptChannel> {
        let mut orchestrator =
            IntelligentOrchestrator::new(channel).with_settings(fast_settings());
        orchestrator.active_plans.insert(plan.id.clone(), plan);
        orchestrator
    }

    #[tokio::test]
    async fn test_unknown_plan_is_an_error() {
        let mut orchestrator = IntelligentOrchestrator::new(Arc::new(ScriptChannel::new()));
        assert!(matches!(
            orchestrator.execute("missing").await,
            Err(OrchestrateError::UnknownPlan(_))
        ));
    }

    #[tokio::test]
    async fn test_sequential_stage_threads_context_forward() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always("code-reviewer", quality_map(90.0))
                .always("metrics-analyzer", quality_map(85.0)),
        );
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string(), "metrics-analyzer".to_string()],
            ExecutionMode::Sequential,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(Arc::clone(&channel), plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.success);
        assert_eq!(result.results.len(), 2);

        // the second invocation sees the first capability's result
        let calls = channel.calls.lock().unwrap();
        let second = calls
            .iter()
            .find(|r| r.to == "metrics-analyzer")
            .unwrap();
        assert!(second.data.context.contains_key("code-reviewer"));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let channel = Arc::new(ScriptChannel::new().on("code-reviewer", |attempt| {
            if attempt == 0 {
                Err(ChannelError::Transport {
                    capability: "code-reviewer".to_string(),
                    reason: "blip".to_string(),
                })
            } else {
                Ok(InvocationResponse::with_data(quality_map(90.0)))
            }
        }));
        let plan = plan_with(vec![
            ExecutionStage::new(
                vec!["code-reviewer".to_string()],
                ExecutionMode::Sequential,
                Value::text("code"),
            )
            .with_retry(RetryStrategy::new(2, Backoff::Linear)),
        ]);
        let mut orchestrator = orchestrator_with(Arc::clone(&channel), plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.success);
        assert_eq!(channel.calls_to("code-reviewer"), 2);
    }

    #[tokio::test]
    async fn test_empty_response_counts_as_failure() {
        let channel = Arc::new(
            ScriptChannel::new().on("code-reviewer", |_| Ok(InvocationResponse::empty())),
        );
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string()],
            ExecutionMode::Sequential,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(!result.success);
        assert!(result.results["code-reviewer"].is_error());
    }

    #[tokio::test]
    async fn test_fallback_substitutes_and_broadcasts() {
        let channel = Arc::new(
            ScriptChannel::new()
                .on("code-reviewer", |_| {
                    Err(ChannelError::Transport {
                        capability: "code-reviewer".to_string(),
                        reason: "down".to_string(),
                    })
                })
                .always("refactor-assistant", quality_map(88.0)),
        );
        let bus = Arc::new(RecordingBus::default());
        let plan = plan_with(vec![
            ExecutionStage::new(
                vec!["code-reviewer".to_string()],
                ExecutionMode::Sequential,
                Value::text("code"),
            )
            .with_retry(
                RetryStrategy::new(1, Backoff::Linear).with_fallback("refactor-assistant"),
            ),
        ]);
        let mut orchestrator = orchestrator_with(channel, plan).with_bus(Arc::clone(&bus) as _);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.success);
        // the substitute's result lands under the original capability id
        assert!(!result.results["code-reviewer"].is_error());
        assert!(bus
            .events
            .lock()
            .unwrap()
            .contains(&"fallback-activated".to_string()));
    }

    #[tokio::test]
    async fn test_parallel_stage_runs_all_members() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always("code-reviewer", quality_map(92.0))
                .always("metrics-analyzer", quality_map(85.0))
                .always("pattern-detector", quality_map(84.0)),
        );
        let plan = plan_with(vec![
            ExecutionStage::new(
                vec![
                    "code-reviewer".to_string(),
                    "metrics-analyzer".to_string(),
                    "pattern-detector".to_string(),
                ],
                ExecutionMode::Parallel,
                Value::text("code"),
            )
            .with_timeout_ms(60_000.0),
        ]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.success);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.tool_durations_ms.len(), 3);
        assert!(result
            .learnings
            .iter()
            .any(|l| l.label == "efficient-parallel" && l.positive));
    }

    #[tokio::test]
    async fn test_consensus_stage_reconciles_disagreement() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always(
                    "security-scanner",
                    Value::map([("security", Value::text("vulnerable"))]),
                )
                .always(
                    "dependency-auditor",
                    Value::map([("security", Value::text("clean"))]),
                ),
        );
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["security-scanner".to_string(), "dependency-auditor".to_string()],
            ExecutionMode::Consensus,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        let consensus = result.consensus.as_ref().unwrap();
        assert_eq!(consensus.outcome["security"], Value::text("vulnerable"));
        assert_eq!(consensus.conflicts.len(), 1);
        assert!(result.results.contains_key("consensus"));
        assert_eq!(result.stage_timings[0].agreement, Some(0.0));
    }

    #[tokio::test]
    async fn test_collapsed_consensus_recovers_through_alternative() {
        let channel = Arc::new(
            ScriptChannel::new().always("metrics-analyzer", quality_map(85.0)),
        );
        let observer = Arc::new(RecordingObserver::default());
        let mut plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string(), "pattern-detector".to_string()],
            ExecutionMode::Consensus,
            Value::text("code"),
        )]);
        plan.alternatives = vec![conductor_domain::PlanAlternative {
            description: "metrics only".to_string(),
            stages: vec![ExecutionStage::new(
                vec!["metrics-analyzer".to_string()],
                ExecutionMode::Sequential,
                Value::text("code"),
            )],
            pros: Vec::new(),
            cons: Vec::new(),
        }];
        let mut orchestrator =
            orchestrator_with(channel, plan).with_observer(Arc::clone(&observer) as _);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.success);
        assert!(result.results.contains_key("metrics-analyzer"));
        let events = observer.events.lock().unwrap();
        assert!(events.contains(&"orchestration:recovery".to_string()));
        assert!(events.contains(&"orchestration:complete".to_string()));
    }

    #[tokio::test]
    async fn test_collapse_without_alternative_surfaces_error() {
        let channel = Arc::new(ScriptChannel::new());
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string()],
            ExecutionMode::Consensus,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(channel, plan);

        assert!(matches!(
            orchestrator.execute("plan-test").await,
            Err(OrchestrateError::StageFailed { stage: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_quality_target_gates_success() {
        let channel = Arc::new(ScriptChannel::new().always("code-reviewer", quality_map(50.0)));
        let mut plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string()],
            ExecutionMode::Sequential,
            Value::text("code"),
        )]);
        plan.requirements = TaskRequirements::default().with_quality(85.0);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(!result.has_errors());
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_no_consensus_stage_skips_reconciliation() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always("code-reviewer", quality_map(90.0))
                .always("metrics-analyzer", quality_map(90.0)),
        );
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string(), "metrics-analyzer".to_string()],
            ExecutionMode::Sequential,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(result.consensus.is_none());
        assert!(!result.results.contains_key("consensus"));
    }

    #[tokio::test]
    async fn test_final_reconciliation_spans_later_stages() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always(
                    "security-scanner",
                    Value::map([("security", Value::text("vulnerable"))]),
                )
                .always(
                    "dependency-auditor",
                    Value::map([("security", Value::text("clean"))]),
                )
                .always("code-reviewer", quality_map(91.0)),
        );
        let plan = plan_with(vec![
            ExecutionStage::new(
                vec![
                    "security-scanner".to_string(),
                    "dependency-auditor".to_string(),
                ],
                ExecutionMode::Consensus,
                Value::text("code"),
            ),
            ExecutionStage::new(
                vec!["code-reviewer".to_string()],
                ExecutionMode::Sequential,
                Value::text("code"),
            ),
        ]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        let consensus = result.consensus.unwrap();
        // the closing reconciliation covers results from every stage
        assert!(consensus.outcome.contains_key("security"));
        assert!(consensus.outcome.contains_key("quality"));
    }

    #[tokio::test]
    async fn test_parallel_member_failure_keeps_sibling_result() {
        let channel = Arc::new(
            ScriptChannel::new()
                .always("code-reviewer", quality_map(90.0))
                .on("pattern-detector", |_| {
                    Err(ChannelError::Transport {
                        capability: "pattern-detector".to_string(),
                        reason: "down".to_string(),
                    })
                }),
        );
        let plan = plan_with(vec![ExecutionStage::new(
            vec!["code-reviewer".to_string(), "pattern-detector".to_string()],
            ExecutionMode::Parallel,
            Value::text("code"),
        )]);
        let mut orchestrator = orchestrator_with(channel, plan);

        let result = orchestrator.execute("plan-test").await.unwrap();
        assert!(!result.success);
        assert!(result.results["pattern-detector"].is_error());
        assert!(!result.results["code-reviewer"].is_error());
    }
}
