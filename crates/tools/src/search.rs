//! Web search tool: stub returning canned results.
//!
//! Flagged `return_direct`, so the result list is handed to the caller as
//! the final answer instead of being summarized by the model.

use async_trait::async_trait;
use incant_core::error::ToolError;
use incant_core::tool::Tool;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

pub struct SearchTool;

#[derive(Debug, Clone, Serialize)]
struct SearchHit {
    title: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct SearchResults {
    results: Vec<SearchHit>,
}

fn canned_results() -> SearchResults {
    SearchResults {
        results: vec![
            SearchHit {
                title: "Incant - The best new LLM framework".into(),
                url: "...".into(),
            },
            SearchHit {
                title: "A simple guide to LLM agents".into(),
                url: "...".into(),
            },
        ],
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Performs a web search for a given query."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search the web for."
                }
            },
            "required": ["query"]
        })
    }

    fn return_direct(&self) -> bool {
        true
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        info!(query, "Web search");
        serde_json::to_value(canned_results()).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}
