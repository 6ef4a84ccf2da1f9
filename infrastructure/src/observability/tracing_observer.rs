//! Lifecycle observer that forwards events to `tracing`
//!
//! Every lifecycle event becomes one structured log line under the
//! `conductor::lifecycle` target, keyed by the event's wire name.

use conductor_application::ports::observer::{LifecycleEvent, OrchestrationObserver};
use tracing::info;

const TARGET: &str = "conductor::lifecycle";

/// Observer that logs lifecycle events
#[derive(Debug, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl OrchestrationObserver for TracingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::OrchestrationStart { plan_id, stages } => {
                info!(target: TARGET, event = event.name(), plan_id, stages);
            }
            LifecycleEvent::StageStart { plan_id, stage, mode } => {
                info!(target: TARGET, event = event.name(), plan_id, stage, mode = %mode);
            }
            LifecycleEvent::StageComplete {
                plan_id,
                stage,
                duration_ms,
            } => {
                info!(target: TARGET, event = event.name(), plan_id, stage, duration_ms);
            }
            LifecycleEvent::OrchestrationRecovery { plan_id, error } => {
                info!(target: TARGET, event = event.name(), plan_id, error);
            }
            LifecycleEvent::OrchestrationComplete { plan_id, success } => {
                info!(target: TARGET, event = event.name(), plan_id, success);
            }
            LifecycleEvent::ConflictStarted {
                conflict_id,
                method,
            } => {
                info!(target: TARGET, event = event.name(), conflict_id, method = method.as_str());
            }
            LifecycleEvent::ConflictResolved {
                conflict_id,
                method,
                agreement,
            } => {
                info!(
                    target: TARGET,
                    event = event.name(),
                    conflict_id,
                    method = method.as_str(),
                    agreement
                );
            }
            LifecycleEvent::TaskAssigned {
                tool_id,
                domain,
                score,
            } => {
                info!(target: TARGET, event = event.name(), tool_id, domain, score);
            }
            LifecycleEvent::ProfileUpdated { tool_id, domain } => {
                info!(target: TARGET, event = event.name(), tool_id, domain);
            }
            LifecycleEvent::CertificationAchieved { tool_id, program } => {
                info!(target: TARGET, event = event.name(), tool_id, program);
            }
        }
    }
}
