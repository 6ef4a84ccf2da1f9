//! Intelligent orchestrator use case
//!
//! Analyzes a task into a staged plan over registered capabilities, executes
//! the plan over the invocation channel, reconciles disagreements into a
//! consensus, and learns from completed runs.
//!
//! Planning lives in [`planner`], execution in [`executor`], consensus
//! building in [`consensus`] and the bounded run history in [`history`].

pub mod consensus;
pub mod executor;
pub mod history;
pub mod planner;

use crate::ports::event_bus::{EventBus, NoBus, ToolEvent};
use crate::ports::invocation::InvocationChannel;
use crate::ports::observer::{NoObserver, OrchestrationObserver};
use crate::ports::performance_sink::{NoSink, PerformanceSink};
use conductor_domain::{CapabilityOutcome, ConsensusResult, OrchestrationPlan, ToolCapability, default_capabilities};
use history::TaskHistory;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by plan execution
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),

    #[error("Stage {stage} failed: {reason}")]
    StageFailed { stage: usize, reason: String },
}

/// Tunable planning and execution parameters
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Runs kept per history bucket
    pub history_cap: usize,
    /// Base delay for retry backoff, in milliseconds
    pub retry_base_delay_ms: u64,
    /// Quality score a capability must reach under the high-quality constraint
    pub quality_floor: f64,
    /// Average time a capability must stay under for the fast-tools constraint
    pub fast_tool_ceiling_ms: f64,
    /// Fraction of successful runs a tool must appear in to be considered
    /// historically proven
    pub success_pattern_threshold: f64,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            history_cap: 100,
            retry_base_delay_ms: 100,
            quality_floor: 85.0,
            fast_tool_ceiling_ms: 1000.0,
            success_pattern_threshold: 0.7,
        }
    }
}

/// Caller-imposed constraint on capability selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningConstraint {
    /// Drop capabilities slower than the fast-tool ceiling
    PreferFastTools,
    /// Drop capabilities below the quality floor
    RequireHighQualityTools,
}

/// Plans and executes multi-stage capability workflows
pub struct IntelligentOrchestrator<C: InvocationChannel + 'static> {
    channel: Arc<C>,
    observer: Arc<dyn OrchestrationObserver>,
    sink: Arc<dyn PerformanceSink>,
    bus: Arc<dyn EventBus>,
    settings: OrchestratorSettings,
    capabilities: BTreeMap<String, ToolCapability>,
    active_plans: BTreeMap<String, OrchestrationPlan>,
    history: TaskHistory,
    next_plan: u64,
}

impl<C: InvocationChannel + 'static> IntelligentOrchestrator<C> {
    /// Create an orchestrator over the built-in capability registry
    pub fn new(channel: Arc<C>) -> Self {
        Self {
            channel,
            observer: Arc::new(NoObserver),
            sink: Arc::new(NoSink),
            bus: Arc::new(NoBus),
            settings: OrchestratorSettings::default(),
            capabilities: default_capabilities()
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            active_plans: BTreeMap::new(),
            history: TaskHistory::new(),
            next_plan: 0,
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn OrchestrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn PerformanceSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Replace the built-in capability registry
    pub fn with_capabilities(mut self, capabilities: Vec<ToolCapability>) -> Self {
        self.capabilities = capabilities
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        self
    }

    /// Register or replace one capability at runtime
    pub fn register_capability(&mut self, capability: ToolCapability) {
        self.capabilities.insert(capability.id.clone(), capability);
    }

    pub fn capability(&self, id: &str) -> Option<&ToolCapability> {
        self.capabilities.get(id)
    }

    pub fn plan(&self, plan_id: &str) -> Option<&OrchestrationPlan> {
        self.active_plans.get(plan_id)
    }

    /// React to an inter-tool event
    ///
    /// Insights above 0.8 confidence nudge the capability's quality score;
    /// out-of-band failures dent its success rate; a consensus request is
    /// answered directly.
    pub fn handle_event(&mut self, event: &ToolEvent) -> Option<ConsensusResult> {
        match event {
            ToolEvent::Insight {
                capability,
                confidence,
                quality,
            } => {
                if *confidence > 0.8 {
                    if let Some(cap) = self.capabilities.get_mut(capability) {
                        let old = cap.performance.quality_score;
                        cap.performance.quality_score =
                            (old * 0.9 + quality * 0.1).clamp(0.0, 100.0);
                        debug!(
                            capability,
                            from = old,
                            to = cap.performance.quality_score,
                            "quality adjusted from insight"
                        );
                    }
                }
                None
            }
            ToolEvent::ToolFailure { capability, error } => {
                if let Some(cap) = self.capabilities.get_mut(capability) {
                    cap.performance.success_rate = (cap.performance.success_rate * 0.9).max(0.0);
                    warn!(capability, error, "success rate dented by reported failure");
                }
                None
            }
            ToolEvent::ConsensusNeeded { results } => {
                let outcomes: BTreeMap<String, CapabilityOutcome> = results
                    .iter()
                    .map(|(k, v)| (k.clone(), CapabilityOutcome::success(v.clone())))
                    .collect();
                Some(consensus::build_consensus(&outcomes, &self.capabilities))
            }
            ToolEvent::FallbackActivated { .. } => None,
        }
    }

    fn next_plan_id(&mut self) -> String {
        self.next_plan += 1;
        format!("plan-{}", self.next_plan)
    }
}
