//! Tool-call protocols: how a backend turn is read as "answer" or "call".
//!
//! Two encodings exist, picked once when an agent is built:
//!
//! - [`StructuredProtocol`] for backends with native function calling. The
//!   reply is already tagged, so decoding is a plain mapping.
//! - [`TextualProtocol`] for text-only backends. A reply is a tool call when
//!   the trimmed text *ends* with
//!
//!   ```text
//!   call:<identifier>(<json object>)
//!   ```
//!
//!   The payload may span lines and be padded with whitespace. Anything that
//!   does not fit (no marker, unterminated parentheses, payload that is not a
//!   strict JSON object) decodes to the original text. Decoding never fails.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::backend::{BackendReply, ToolSpec};
use crate::message::ToolCall;

/// A decoded backend turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The model's final answer
    FreeText(String),
    /// The model wants a tool run
    ToolInvocation(ToolCall),
}

/// Decode one backend turn into [`Decoded`].
pub trait ToolCallProtocol: Send + Sync {
    fn kind(&self) -> ProtocolKind;

    fn decode(&self, reply: BackendReply) -> Decoded;
}

/// Which protocol an agent speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// Native function calling
    #[default]
    Structured,
    /// `call:<name>(<json>)` embedded in text
    Textual,
}

impl ProtocolKind {
    /// Instantiate the matching protocol.
    pub fn build(self) -> Arc<dyn ToolCallProtocol> {
        match self {
            ProtocolKind::Structured => Arc::new(StructuredProtocol),
            ProtocolKind::Textual => Arc::new(TextualProtocol),
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Structured => f.write_str("structured"),
            ProtocolKind::Textual => f.write_str("textual"),
        }
    }
}

impl FromStr for ProtocolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" => Ok(ProtocolKind::Structured),
            "textual" | "text" => Ok(ProtocolKind::Textual),
            other => Err(format!(
                "unknown tool-call protocol '{other}' (expected 'structured' or 'textual')"
            )),
        }
    }
}

/// The backend already distinguishes text from tool calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredProtocol;

impl ToolCallProtocol for StructuredProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Structured
    }

    fn decode(&self, reply: BackendReply) -> Decoded {
        match reply {
            BackendReply::Text { text } => Decoded::FreeText(text),
            BackendReply::ToolCall { name, arguments } => {
                Decoded::ToolInvocation(ToolCall::new(name, arguments))
            }
        }
    }
}

/// Tool calls are embedded in plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextualProtocol;

impl ToolCallProtocol for TextualProtocol {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Textual
    }

    fn decode(&self, reply: BackendReply) -> Decoded {
        match reply {
            BackendReply::Text { text } => match parse_tool_call(&text) {
                Some(call) => Decoded::ToolInvocation(call),
                None => Decoded::FreeText(text),
            },
            // A backend that does native calls anyway is taken at its word.
            BackendReply::ToolCall { name, arguments } => {
                Decoded::ToolInvocation(ToolCall::new(name, arguments))
            }
        }
    }
}

static TOOL_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)call:([A-Za-z0-9_]+)\s*\((.*?)\)\s*$").unwrap());

/// Extract a trailing `call:<name>(<json object>)` from `text`.
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    let caps = TOOL_CALL_RE.captures(text.trim())?;
    let name = &caps[1];
    let payload = &caps[2];

    match serde_json::from_str::<Map<String, Value>>(payload) {
        Ok(arguments) => Some(ToolCall::new(name, arguments)),
        Err(e) => {
            debug!(tool = %name, error = %e, "Tool-call arguments are not a JSON object, treating reply as text");
            None
        }
    }
}

/// Instructions that teach a text-only model the `call:` syntax.
///
/// Returns `None` for an empty catalog, since there is nothing to call.
pub fn render_instructions(tools: &[ToolSpec]) -> Option<String> {
    if tools.is_empty() {
        return None;
    }

    let mut out = String::from(
        "You can use tools. To use one, end your reply with a single tool call of the form\n\
         call:<tool_name>(<JSON object with the arguments>)\n\
         and write nothing after it. The tool's result will be sent back to you.\n\
         If no tool is needed, answer normally.\n\n\
         Available tools:\n",
    );
    for tool in tools {
        out.push_str(&format!(
            "- {}: {}\n  arguments schema: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }
    Some(out)
}
