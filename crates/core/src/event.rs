//! Domain events: what the agent loop did, for whoever is listening.
//!
//! Publishing never blocks and never fails; with no subscribers the events
//! are simply dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// An invocation began
    InvocationStarted {
        history_len: usize,
        tools_offered: usize,
        timestamp: DateTime<Utc>,
    },

    /// The backend was consulted
    BackendCalled {
        backend: String,
        iteration: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool call was dispatched
    ToolInvoked {
        tool_name: String,
        arguments: serde_json::Map<String, serde_json::Value>,
        found: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The invocation produced its final answer
    AnswerProduced {
        direct: bool,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolInvoked {
            tool_name: "calculator".into(),
            arguments: serde_json::Map::new(),
            found: true,
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolInvoked { tool_name, found, .. } => {
                assert_eq!(tool_name, "calculator");
                assert!(found);
            }
            _ => panic!("Expected ToolInvoked event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::AnswerProduced {
            direct: false,
            iterations: 1,
            timestamp: Utc::now(),
        });
    }
}
