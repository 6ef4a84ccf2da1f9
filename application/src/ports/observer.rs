//! Observability hook
//!
//! The use cases emit advisory lifecycle events; external logging or metrics
//! collectors subscribe through this port. Correctness never depends on a
//! listener being present.

use conductor_domain::{ExecutionMode, ResolutionMethod};

/// A lifecycle event emitted by one of the use cases
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    OrchestrationStart {
        plan_id: String,
        stages: usize,
    },
    StageStart {
        plan_id: String,
        stage: usize,
        mode: ExecutionMode,
    },
    StageComplete {
        plan_id: String,
        stage: usize,
        duration_ms: f64,
    },
    OrchestrationRecovery {
        plan_id: String,
        error: String,
    },
    OrchestrationComplete {
        plan_id: String,
        success: bool,
    },
    ConflictStarted {
        conflict_id: String,
        method: ResolutionMethod,
    },
    ConflictResolved {
        conflict_id: String,
        method: ResolutionMethod,
        agreement: f64,
    },
    TaskAssigned {
        tool_id: String,
        domain: String,
        score: f64,
    },
    ProfileUpdated {
        tool_id: String,
        domain: String,
    },
    CertificationAchieved {
        tool_id: String,
        program: String,
    },
}

impl LifecycleEvent {
    /// The advertised name of this event
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::OrchestrationStart { .. } => "orchestration:start",
            LifecycleEvent::StageStart { .. } => "stage:start",
            LifecycleEvent::StageComplete { .. } => "stage:complete",
            LifecycleEvent::OrchestrationRecovery { .. } => "orchestration:recovery",
            LifecycleEvent::OrchestrationComplete { .. } => "orchestration:complete",
            LifecycleEvent::ConflictStarted { .. } => "conflict:started",
            LifecycleEvent::ConflictResolved { .. } => "conflict:resolved",
            LifecycleEvent::TaskAssigned { .. } => "task:assigned",
            LifecycleEvent::ProfileUpdated { .. } => "profile:updated",
            LifecycleEvent::CertificationAchieved { .. } => "certification:achieved",
        }
    }
}

/// Port for lifecycle event listeners
pub trait OrchestrationObserver: Send + Sync {
    fn on_event(&self, event: &LifecycleEvent);
}

/// No-op observer
pub struct NoObserver;

impl OrchestrationObserver for NoObserver {
    fn on_event(&self, _event: &LifecycleEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_contract() {
        let event = LifecycleEvent::OrchestrationStart {
            plan_id: "plan-1".to_string(),
            stages: 2,
        };
        assert_eq!(event.name(), "orchestration:start");

        let event = LifecycleEvent::CertificationAchieved {
            tool_id: "security-scanner".to_string(),
            program: "domain-specialist".to_string(),
        };
        assert_eq!(event.name(), "certification:achieved");

        let event = LifecycleEvent::ConflictResolved {
            conflict_id: "c-1".to_string(),
            method: ResolutionMethod::Voting,
            agreement: 0.7,
        };
        assert_eq!(event.name(), "conflict:resolved");
    }
}
