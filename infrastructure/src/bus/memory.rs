//! In-memory event bus
//!
//! Collects published inter-tool events so a host process can poll and relay
//! them. Publishing never blocks and never fails.

use conductor_application::ports::event_bus::{EventBus, ToolEvent};
use std::sync::Mutex;
use tracing::debug;

/// Event bus backed by an in-process buffer
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    events: Mutex<Vec<ToolEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered events, leaving the buffer empty
    pub fn drain(&self) -> Vec<ToolEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, event: ToolEvent) {
        debug!(event = event.name(), "tool event published");
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}
