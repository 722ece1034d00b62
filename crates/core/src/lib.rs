//! # Incant Core
//!
//! Domain types, traits, and error definitions for the Incant agent loop.
//! This crate defines the contracts the orchestration loop is written
//! against; concrete backends, stores and tools live in their own crates.
//!
//! ## Layout
//!
//! - [`message`]: conversation turns with a type-enforced payload
//! - [`backend`]: the language-model backend contract
//! - [`store`]: the conversation store contract
//! - [`tool`]: tool definitions and the injectable [`ToolRegistry`]
//! - [`protocol`]: structured and textual tool-call decoding
//! - [`agent`]: immutable per-agent configuration
//! - [`event`]: domain events for observers

pub mod agent;
pub mod backend;
pub mod error;
pub mod event;
pub mod message;
pub mod protocol;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::AgentConfig;
pub use backend::{Backend, BackendReply, ToolSpec};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Message, Role, ToolCall, ToolResult};
pub use protocol::{
    Decoded, ProtocolKind, StructuredProtocol, TextualProtocol, ToolCallProtocol,
};
pub use store::ConversationStore;
pub use tool::{Tool, ToolDefinition, ToolHandler, ToolRegistry, handler_fn};
