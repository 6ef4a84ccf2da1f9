//! Capability invocation port
//!
//! Capabilities are executed by external collaborators reached through a
//! uniform request channel. A response without a `data` payload is a failure
//! signal, whatever the transport says.

use async_trait::async_trait;
use conductor_domain::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors surfaced by the invocation channel itself
#[derive(Error, Debug, Clone)]
pub enum ChannelError {
    #[error("Transport failure reaching {capability}: {reason}")]
    Transport { capability: String, reason: String },

    #[error("Capability {0} returned no result payload")]
    EmptyResponse(String),

    #[error("Capability {0} timed out")]
    Timeout(String),
}

/// Input payload plus accumulated execution context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationData {
    pub input: Value,
    /// Results published by earlier capabilities in the same run
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

/// A single execute request to a capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub from: String,
    /// Target capability identifier
    pub to: String,
    /// Message kind; always `request` for capability execution
    pub kind: String,
    /// Message subject; always `execute` for capability execution
    pub subject: String,
    pub data: InvocationData,
    /// Sender confidence in [0, 1]
    pub confidence: f64,
}

impl InvocationRequest {
    /// Build an execute request from the orchestrator
    pub fn execute(
        to: impl Into<String>,
        input: Value,
        context: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            from: "orchestrator".to_string(),
            to: to.into(),
            kind: "request".to_string(),
            subject: "execute".to_string(),
            data: InvocationData { input, context },
            confidence: 0.8,
        }
    }
}

/// Response from a capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResponse {
    /// The result payload; `None` signals failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InvocationResponse {
    pub fn with_data(data: Value) -> Self {
        Self { data: Some(data) }
    }

    pub fn empty() -> Self {
        Self { data: None }
    }
}

/// Port for invoking external capabilities
#[async_trait]
pub trait InvocationChannel: Send + Sync {
    /// Send one request and await the response
    async fn request(&self, request: InvocationRequest) -> Result<InvocationResponse, ChannelError>;
}
