//! Scripted invocation channel
//!
//! Answers capability requests from preloaded outcomes. Each capability has
//! a queue of one-shot outcomes consumed in order, then an optional sticky
//! outcome repeated forever. Every request is logged for inspection.
//!
//! Useful for demos, local dry runs and tests of anything that drives the
//! invocation port.

use async_trait::async_trait;
use conductor_application::ports::invocation::{
    ChannelError, InvocationChannel, InvocationRequest, InvocationResponse,
};
use conductor_domain::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// One canned reply
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Respond with a payload
    Respond(Value),
    /// Respond without a payload (the failure signal)
    Empty,
    /// Fail at the transport level
    Unreachable(String),
}

impl ScriptedOutcome {
    fn into_result(self, capability: &str) -> Result<InvocationResponse, ChannelError> {
        match self {
            ScriptedOutcome::Respond(value) => Ok(InvocationResponse::with_data(value)),
            ScriptedOutcome::Empty => Ok(InvocationResponse::empty()),
            ScriptedOutcome::Unreachable(reason) => Err(ChannelError::Transport {
                capability: capability.to_string(),
                reason,
            }),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<ScriptedOutcome>,
    sticky: Option<ScriptedOutcome>,
}

/// Channel answering from per-capability scripts
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    scripts: Mutex<BTreeMap<String, Script>>,
    requests: Mutex<Vec<InvocationRequest>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot outcome for a capability
    pub fn enqueue(&self, capability: impl Into<String>, outcome: ScriptedOutcome) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts
            .entry(capability.into())
            .or_default()
            .queued
            .push_back(outcome);
    }

    /// Set the outcome repeated once the queue is drained
    pub fn set_sticky(&self, capability: impl Into<String>, outcome: ScriptedOutcome) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts.entry(capability.into()).or_default().sticky = Some(outcome);
    }

    /// Builder-style sticky success response
    pub fn responding(self, capability: impl Into<String>, value: Value) -> Self {
        self.set_sticky(capability, ScriptedOutcome::Respond(value));
        self
    }

    /// All requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of requests addressed to one capability
    pub fn requests_to(&self, capability: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.to == capability)
            .count()
    }
}

#[async_trait]
impl InvocationChannel for ScriptedChannel {
    async fn request(
        &self,
        request: InvocationRequest,
    ) -> Result<InvocationResponse, ChannelError> {
        let capability = request.to.clone();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let outcome = {
            let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
            match scripts.get_mut(&capability) {
                Some(script) => script.queued.pop_front().or_else(|| script.sticky.clone()),
                None => None,
            }
        };

        match outcome {
            Some(outcome) => outcome.into_result(&capability),
            None => Err(ChannelError::Transport {
                capability: capability.clone(),
                reason: "no scripted outcome".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_drains_before_sticky() {
        let channel = ScriptedChannel::new();
        channel.enqueue("code-reviewer", ScriptedOutcome::Unreachable("warming up".to_string()));
        channel.set_sticky("code-reviewer", ScriptedOutcome::Respond(Value::number(1.0)));

        let first = channel
            .request(InvocationRequest::execute(
                "code-reviewer",
                Value::text("x"),
                BTreeMap::new(),
            ))
            .await;
        assert!(first.is_err());

        let second = channel
            .request(InvocationRequest::execute(
                "code-reviewer",
                Value::text("x"),
                BTreeMap::new(),
            ))
            .await
            .unwrap();
        assert_eq!(second.data, Some(Value::number(1.0)));
        assert_eq!(channel.requests_to("code-reviewer"), 2);
    }

    #[tokio::test]
    async fn test_unscripted_capability_is_unreachable() {
        let channel = ScriptedChannel::new();
        let result = channel
            .request(InvocationRequest::execute(
                "ghost",
                Value::text("x"),
                BTreeMap::new(),
            ))
            .await;
        assert!(matches!(result, Err(ChannelError::Transport { .. })));
    }
}
