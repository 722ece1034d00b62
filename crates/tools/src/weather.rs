//! Weather tool: stub returning canned conditions for a city.
//!
//! No weather API is called. The canned data is enough to exercise the
//! call, result and summarize round-trip of the agent loop.

use async_trait::async_trait;
use incant_core::error::ToolError;
use incant_core::tool::Tool;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

pub struct WeatherTool;

#[derive(Debug, Serialize)]
struct Conditions {
    temperature: &'static str,
    condition: &'static str,
}

fn conditions_for(city: &str) -> Conditions {
    if city.trim().eq_ignore_ascii_case("london") {
        Conditions {
            temperature: "15°C",
            condition: "Cloudy",
        }
    } else {
        Conditions {
            temperature: "25°C",
            condition: "Sunny",
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Gets the current weather for a specified city."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to get the weather for, e.g., \"London\""
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let city = arguments
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))?;

        info!(city, "Weather lookup");
        serde_json::to_value(conditions_for(city)).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("city".into(), json!(name));
        map
    }

    #[tokio::test]
    async fn london_is_cloudy() {
        let out = WeatherTool.execute(city("London")).await.unwrap();
        assert_eq!(out, json!({"temperature": "15°C", "condition": "Cloudy"}));

        let lower = WeatherTool.execute(city("london")).await.unwrap();
        assert_eq!(lower, out);
    }

    #[tokio::test]
    async fn elsewhere_is_sunny() {
        let out = WeatherTool.execute(city("Tokyo")).await.unwrap();
        assert_eq!(out, json!({"temperature": "25°C", "condition": "Sunny"}));
    }

    #[tokio::test]
    async fn missing_city_is_invalid() {
        let err = WeatherTool.execute(Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
