//! Message domain types.
//!
//! A [`Message`] is one turn in a conversation. Each turn carries exactly one
//! payload, and which payloads are legal depends on the role:
//!
//! | role    | payload                      |
//! |---------|------------------------------|
//! | `user`  | text                         |
//! | `model` | text, or a [`ToolCall`]      |
//! | `tool`  | a [`ToolResult`]             |
//!
//! The payload is private and only reachable through constructors, so a
//! contradictory message cannot be built. The serialized form is flat
//! (`role` + one of `content` / `tool_call` / `tool_result`) and is validated
//! on the way back in.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Error;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The language model
    Model,
    /// Output of a tool invocation
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Model => "model",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A request from the model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID, carried into the matching [`ToolResult`]
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as an ordered JSON object
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a call with a freshly generated ID.
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }
}

/// The output of a tool, paired with the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The originating invocation
    pub call: ToolCall,

    /// Whatever the handler returned
    pub output: Value,
}

impl ToolResult {
    /// Render the output as text: strings as themselves, anything else as
    /// compact JSON.
    pub fn output_text(&self) -> Cow<'_, str> {
        match &self.output {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Text(String),
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireMessage", into = "WireMessage")]
pub struct Message {
    id: String,
    role: Role,
    payload: Payload,
    timestamp: DateTime<Utc>,
}

impl Message {
    fn with_payload(role: Role, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_payload(Role::User, Payload::Text(content.into()))
    }

    /// Create a new free-text model message.
    pub fn model(content: impl Into<String>) -> Self {
        Self::with_payload(Role::Model, Payload::Text(content.into()))
    }

    /// Create a model message recording a tool invocation.
    pub fn tool_call(call: ToolCall) -> Self {
        Self::with_payload(Role::Model, Payload::ToolCall(call))
    }

    /// Create a tool message carrying the result of `call`.
    pub fn tool_result(call: ToolCall, output: Value) -> Self {
        Self::with_payload(Role::Tool, Payload::ToolResult(ToolResult { call, output }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The plain text of a user or model text turn.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match &self.payload {
            Payload::ToolCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match &self.payload {
            Payload::ToolResult(result) => Some(result),
            _ => None,
        }
    }

    /// Textual rendering of the turn, whatever its payload.
    ///
    /// Tool calls render in the `call:<name>(<json>)` syntax understood by
    /// [`TextualProtocol`](crate::protocol::TextualProtocol); tool results
    /// render via [`ToolResult::output_text`].
    pub fn content(&self) -> Cow<'_, str> {
        match &self.payload {
            Payload::Text(text) => Cow::Borrowed(text.as_str()),
            Payload::ToolCall(call) => Cow::Owned(format!(
                "call:{}({})",
                call.name,
                Value::Object(call.arguments.clone())
            )),
            Payload::ToolResult(result) => result.output_text(),
        }
    }
}

/// Flat serialized form of a [`Message`].
#[derive(Serialize, Deserialize)]
struct WireMessage {
    #[serde(default)]
    id: String,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call: Option<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_result: Option<ToolResult>,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<WireMessage> for Message {
    type Error = Error;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let payload = match (wire.role, wire.content, wire.tool_call, wire.tool_result) {
            (Role::User | Role::Model, Some(text), None, None) => Payload::Text(text),
            (Role::Model, None, Some(call), None) => Payload::ToolCall(call),
            (Role::Tool, None, None, Some(result)) => Payload::ToolResult(result),
            (role, ..) => {
                return Err(Error::InvalidMessage(format!(
                    "a {role} message must carry exactly one payload allowed for its role"
                )));
            }
        };

        let id = if wire.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            wire.id
        };

        Ok(Self {
            id,
            role: wire.role,
            payload,
            timestamp: wire.timestamp,
        })
    }
}

impl From<Message> for WireMessage {
    fn from(msg: Message) -> Self {
        let (content, tool_call, tool_result) = match msg.payload {
            Payload::Text(text) => (Some(text), None, None),
            Payload::ToolCall(call) => (None, Some(call), None),
            Payload::ToolResult(result) => (None, None, Some(result)),
        };
        Self {
            id: msg.id,
            role: msg.role,
            content,
            tool_call,
            tool_result,
            timestamp: msg.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.text(), Some("Hello, agent!"));
        assert!(msg.as_tool_call().is_none());
    }

    #[test]
    fn tool_call_is_a_model_turn_without_text() {
        let call = ToolCall::new("calculator", args(json!({"expression": "2 * 3"})));
        let msg = Message::tool_call(call);
        assert_eq!(msg.role(), Role::Model);
        assert!(msg.text().is_none());
        assert_eq!(msg.as_tool_call().unwrap().name, "calculator");
        assert_eq!(msg.content(), r#"call:calculator({"expression":"2 * 3"})"#);
    }

    #[test]
    fn tool_result_content_renders_strings_verbatim() {
        let call = ToolCall::new("missing", Map::new());
        let msg = Message::tool_result(call, json!("Error: Tool 'missing' not found."));
        assert_eq!(msg.role(), Role::Tool);
        assert_eq!(msg.content(), "Error: Tool 'missing' not found.");
    }

    #[test]
    fn tool_result_content_renders_structures_as_json() {
        let call = ToolCall::new("get_weather", Map::new());
        let msg = Message::tool_result(call, json!({"temperature": "15°C"}));
        assert_eq!(msg.content(), r#"{"temperature":"15°C"}"#);
    }

    #[test]
    fn wire_form_is_flat() {
        let json = serde_json::to_value(Message::model("Hi there!")).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["content"], "Hi there!");
        assert!(json.get("tool_call").is_none());
        assert!(json.get("tool_result").is_none());
    }

    #[test]
    fn tool_result_survives_serialization() {
        let call = ToolCall::new("calculator", args(json!({"expression": "2 * 3"})));
        let msg = Message::tool_result(call.clone(), json!(6));
        let text = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&text).unwrap();
        assert_eq!(back.id(), msg.id());
        let result = back.as_tool_result().unwrap();
        assert_eq!(result.call, call);
        assert_eq!(result.output, json!(6));
    }

    #[test]
    fn contradictory_payloads_are_rejected() {
        let both = json!({
            "role": "model",
            "content": "text",
            "tool_call": {"id": "c1", "name": "x", "arguments": {}}
        });
        assert!(serde_json::from_value::<Message>(both).is_err());

        let user_tool_result = json!({
            "role": "user",
            "tool_result": {"call": {"id": "c1", "name": "x"}, "output": null}
        });
        assert!(serde_json::from_value::<Message>(user_tool_result).is_err());

        let empty = json!({"role": "tool"});
        assert!(serde_json::from_value::<Message>(empty).is_err());
    }

    #[test]
    fn missing_id_is_generated() {
        let msg: Message = serde_json::from_value(json!({"role": "user", "content": "Hello"})).unwrap();
        assert!(!msg.id().is_empty());
        assert_eq!(msg.text(), Some("Hello"));
    }
}
