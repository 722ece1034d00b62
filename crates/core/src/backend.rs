//! Backend trait: the abstraction over language-model services.
//!
//! A backend receives the accumulated conversation plus the advertised tool
//! catalog and answers with one [`BackendReply`]. Backends with native
//! function calling return [`BackendReply::ToolCall`]; text-only backends
//! always return [`BackendReply::Text`] and leave tool-call recognition to
//! the [`TextualProtocol`](crate::protocol::TextualProtocol).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::message::Message;

/// A catalog entry advertised to the backend so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: Value,
}

/// One raw turn produced by a backend, before protocol decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendReply {
    /// Free-form text
    Text { text: String },

    /// A native function-calling request
    ToolCall {
        name: String,
        #[serde(default)]
        arguments: Map<String, Value>,
    },
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self::ToolCall {
            name: name.into(),
            arguments,
        }
    }
}

/// The core Backend trait.
///
/// The agent loop calls `generate()` without knowing which service is behind
/// it. Implementations must accept an empty `tools` slice (no tools offered)
/// and must not retry on their own; failures propagate to the loop's caller.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g., "gemini").
    fn name(&self) -> &str;

    /// Produce the next turn for `turns`, optionally calling one of `tools`.
    async fn generate(
        &self,
        turns: &[Message],
        tools: &[ToolSpec],
    ) -> std::result::Result<BackendReply, ProviderError>;
}
