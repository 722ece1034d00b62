//! Agent configuration.
//!
//! An agent is nothing but its configuration: which backend to consult,
//! where (if anywhere) history lives, which tools it may advertise, the
//! registry those names resolve against, and the tool-call protocol. All of
//! it is fixed at construction; the mutable part of a conversation lives in
//! the store.

use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::event::EventBus;
use crate::protocol::{ProtocolKind, ToolCallProtocol};
use crate::store::ConversationStore;
use crate::tool::ToolRegistry;

/// Immutable per-agent configuration.
#[derive(Clone)]
pub struct AgentConfig {
    /// The language-model backend
    pub backend: Arc<dyn Backend>,

    /// Optional conversation store; `None` means every invocation starts fresh
    pub store: Option<Arc<dyn ConversationStore>>,

    /// Tool names this agent may advertise, in catalog order
    pub tools: Vec<String>,

    /// Registry the tool names are resolved against
    pub registry: Arc<ToolRegistry>,

    /// How backend turns are decoded
    pub protocol: Arc<dyn ToolCallProtocol>,

    /// Safety limit on backend calls per invocation (unbounded when `None`)
    pub max_iterations: Option<u32>,

    /// Optional event bus for observers
    pub events: Option<Arc<EventBus>>,
}

impl AgentConfig {
    /// A toolless, storeless configuration speaking the structured protocol.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            store: None,
            tools: Vec::new(),
            registry: Arc::new(ToolRegistry::new()),
            protocol: ProtocolKind::default().build(),
            max_iterations: None,
            events: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_tools<I, S>(mut self, registry: Arc<ToolRegistry>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry = registry;
        self.tools = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_protocol(mut self, protocol: Arc<dyn ToolCallProtocol>) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("backend", &self.backend.name())
            .field("store", &self.store.as_ref().map(|s| s.name()))
            .field("tools", &self.tools)
            .field("protocol", &self.protocol.kind())
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}
