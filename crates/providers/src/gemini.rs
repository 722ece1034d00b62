//! Google Gemini backend.
//!
//! Uses the `generateContent` REST endpoint directly.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - Roles mapped as user → `user`, model → `model`, tool → `function`
//! - Native function calling with `functionCall` / `functionResponse` parts
//! - Text mode for the textual protocol: tools are described in the system
//!   instruction and calls travel as plain `call:<name>(<json>)` text

use std::time::Duration;

use async_trait::async_trait;
use incant_core::backend::{Backend, BackendReply, ToolSpec};
use incant_core::error::ProviderError;
use incant_core::message::{Message, Role};
use incant_core::protocol::{ProtocolKind, render_instructions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    base_url: String,
    api_key: String,
    model: String,
    protocol: ProtocolKind,
    system_prompt: Option<String>,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Create a backend using native function calling.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            protocol: ProtocolKind::Structured,
            system_prompt: None,
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Match the wire format to the agent's tool-call protocol.
    pub fn with_protocol(mut self, protocol: ProtocolKind) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn native_tools(&self) -> bool {
        self.protocol == ProtocolKind::Structured
    }

    /// Convert conversation turns to Gemini `contents`.
    fn to_api_contents(&self, turns: &[Message]) -> Vec<Content> {
        turns
            .iter()
            .map(|msg| {
                let native = self.native_tools();
                let (role, part) = match (msg.role(), msg.as_tool_call(), msg.as_tool_result()) {
                    (Role::Model, Some(call), _) if native => (
                        "model",
                        Part::function_call(FunctionCall {
                            name: call.name.clone(),
                            args: call.arguments.clone(),
                        }),
                    ),
                    (Role::Tool, _, Some(result)) if native => (
                        "function",
                        Part::function_response(FunctionResponse {
                            name: result.call.name.clone(),
                            response: wrap_output(&result.output),
                        }),
                    ),
                    (Role::Tool, _, Some(result)) => {
                        let text = format!(
                            "Result of tool '{}': {}",
                            result.call.name,
                            result.output_text()
                        );
                        ("user", Part::text(text))
                    }
                    (Role::Model, ..) => ("model", Part::text(msg.content().into_owned())),
                    (Role::User | Role::Tool, ..) => {
                        ("user", Part::text(msg.content().into_owned()))
                    }
                };
                Content {
                    role: Some(role.to_string()),
                    parts: vec![part],
                }
            })
            .collect()
    }

    /// Convert the tool catalog to a Gemini `tools` entry.
    fn to_api_tools(tools: &[ToolSpec]) -> Vec<GeminiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }

    fn build_request(&self, turns: &[Message], tools: &[ToolSpec]) -> GenerateRequest {
        let mut system = Vec::new();
        if let Some(prompt) = &self.system_prompt {
            system.push(prompt.clone());
        }

        let api_tools = if self.native_tools() {
            Self::to_api_tools(tools)
        } else {
            system.extend(render_instructions(tools));
            Vec::new()
        };

        GenerateRequest {
            contents: self.to_api_contents(turns),
            tools: api_tools,
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part::text(system.join("\n\n"))],
            }),
        }
    }

    /// Convert a Gemini response to a [`BackendReply`].
    fn parse_response(resp: GenerateResponse) -> Result<BackendReply, ProviderError> {
        let Some(candidate) = resp.candidates.into_iter().next() else {
            let reason = resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".into());
            return Err(ProviderError::InvalidResponse(reason));
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        let mut text = String::new();
        for part in parts {
            if let Some(call) = part.function_call {
                return Ok(BackendReply::tool_call(call.name, call.args));
            }
            if let Some(t) = part.text {
                text.push_str(&t);
            }
        }
        Ok(BackendReply::text(text))
    }
}

/// Map a non-success HTTP status to a [`ProviderError`].
fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed("Invalid Gemini API key".into()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

/// `functionResponse.response` must be an object.
fn wrap_output(output: &Value) -> Map<String, Value> {
    match output {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("result".into(), other.clone());
            map
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        turns: &[Message],
        tools: &[ToolSpec],
    ) -> Result<BackendReply, ProviderError> {
        if turns.is_empty() {
            return Ok(BackendReply::text(""));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.build_request(turns, tools);

        debug!(
            backend = "gemini",
            model = %self.model,
            turns = turns.len(),
            tools = body.tools.first().map_or(0, |t| t.function_declarations.len()),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(status_error(status, error_body));
        }

        let api_resp: GenerateResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Gemini response: {e}"))
        })?;

        Self::parse_response(api_resp)
    }
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }

    fn function_call(call: FunctionCall) -> Self {
        Self {
            function_call: Some(call),
            ..Default::default()
        }
    }

    fn function_response(response: FunctionResponse) -> Self {
        Self {
            function_response: Some(response),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use incant_core::message::ToolCall;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn weather_spec() -> ToolSpec {
        ToolSpec {
            name: "get_weather".into(),
            description: "Gets the current weather for a specified city.".into(),
            parameters: json!({
                "type": "object",
                "properties": { "city": { "type": "string" } },
                "required": ["city"]
            }),
        }
    }

    fn tool_exchange() -> Vec<Message> {
        let call = ToolCall::new("get_weather", args(json!({"city": "London"})));
        vec![
            Message::user("Weather in London?"),
            Message::tool_call(call.clone()),
            Message::tool_result(call, json!({"temperature": "15°C", "condition": "Cloudy"})),
        ]
    }

    #[test]
    fn constructor() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        assert_eq!(backend.name(), "gemini");
        assert_eq!(backend.model(), "gemini-1.5-flash");
        assert_eq!(backend.base_url, DEFAULT_BASE_URL);
        assert!(backend.native_tools());
    }

    #[test]
    fn constructor_with_base_url() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL).with_base_url("http://localhost:8080/");
        assert_eq!(backend.base_url, "http://localhost:8080");
    }

    #[test]
    fn roles_are_mapped() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let contents = backend.to_api_contents(&tool_exchange());

        let roles: Vec<&str> = contents.iter().filter_map(|c| c.role.as_deref()).collect();
        assert_eq!(roles, vec!["user", "model", "function"]);

        let call = contents[1].parts[0].function_call.as_ref().unwrap();
        assert_eq!(call.name, "get_weather");
        assert_eq!(call.args["city"], "London");

        let response = contents[2].parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.name, "get_weather");
        assert_eq!(response.response["condition"], "Cloudy");
    }

    #[test]
    fn plain_model_turns_stay_text_in_native_mode() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let contents = backend.to_api_contents(&[Message::user("Hi"), Message::model("Hello!")]);

        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(contents[1].parts[0].text.as_deref(), Some("Hello!"));
        assert!(contents[1].parts[0].function_call.is_none());
    }

    #[test]
    fn scalar_tool_output_is_wrapped() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let call = ToolCall::new("missing", Map::new());
        let turns = vec![Message::tool_result(
            call,
            json!("Error: Tool 'missing' not found."),
        )];
        let contents = backend.to_api_contents(&turns);
        let response = contents[0].parts[0].function_response.as_ref().unwrap();
        assert_eq!(
            Value::Object(response.response.clone()),
            json!({"result": "Error: Tool 'missing' not found."})
        );
    }

    #[test]
    fn text_mode_sends_everything_as_text() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL).with_protocol(ProtocolKind::Textual);
        let contents = backend.to_api_contents(&tool_exchange());

        assert!(contents.iter().all(|c| c.parts[0].function_call.is_none()));
        assert_eq!(contents[1].role.as_deref(), Some("model"));
        assert_eq!(
            contents[1].parts[0].text.as_deref(),
            Some(r#"call:get_weather({"city":"London"})"#)
        );
        assert_eq!(contents[2].role.as_deref(), Some("user"));
        assert!(contents[2].parts[0].text.as_deref().unwrap().contains("Cloudy"));
    }

    #[test]
    fn native_request_declares_functions() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let body = serde_json::to_value(
            backend.build_request(&[Message::user("Hi")], &[weather_spec()]),
        )
        .unwrap();

        assert_eq!(body["tools"][0]["functionDeclarations"][0]["name"], "get_weather");
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hi");
    }

    #[test]
    fn empty_catalog_sends_no_tools() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let body = serde_json::to_value(backend.build_request(&[Message::user("Hi")], &[])).unwrap();
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn text_request_describes_tools_in_system_instruction() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL)
            .with_protocol(ProtocolKind::Textual)
            .with_system_prompt("Be brief.");
        let body = serde_json::to_value(
            backend.build_request(&[Message::user("Hi")], &[weather_spec()]),
        )
        .unwrap();

        assert!(body.get("tools").is_none());
        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.starts_with("Be brief."));
        assert!(system.contains("- get_weather:"));
    }

    #[test]
    fn parse_text_response() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": " there!"}]},
                    "finishReason": "STOP"
                }]
            }"#,
        )
        .unwrap();

        let reply = GeminiBackend::parse_response(resp).unwrap();
        assert_eq!(reply, BackendReply::text("Hello there!"));
    }

    #[test]
    fn parse_function_call_response() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [
                        {"functionCall": {"name": "get_weather", "args": {"city": "London"}}}
                    ]}
                }]
            }"#,
        )
        .unwrap();

        match GeminiBackend::parse_response(resp).unwrap() {
            BackendReply::ToolCall { name, arguments } => {
                assert_eq!(name, "get_weather");
                assert_eq!(arguments["city"], "London");
            }
            other => panic!("Expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn blocked_prompt_is_an_invalid_response() {
        let resp: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let err = GeminiBackend::parse_response(resp).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(reason) if reason == "SAFETY"));
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(matches!(status_error(429, String::new()), ProviderError::RateLimited { .. }));
        assert!(matches!(status_error(401, String::new()), ProviderError::AuthenticationFailed(_)));
        assert!(matches!(status_error(403, String::new()), ProviderError::AuthenticationFailed(_)));
        assert!(matches!(
            status_error(500, "boom".into()),
            ProviderError::ApiError { status_code: 500, message } if message == "boom"
        ));
    }

    #[tokio::test]
    async fn empty_turns_skip_the_request() {
        // Port 9 (discard) is never contacted.
        let backend = GeminiBackend::new("key", DEFAULT_MODEL).with_base_url("http://127.0.0.1:9");
        let reply = backend.generate(&[], &[weather_spec()]).await.unwrap();
        assert_eq!(reply, BackendReply::text(""));
    }
}
