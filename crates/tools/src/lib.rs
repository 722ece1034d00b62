//! Built-in tools for Incant agents.
//!
//! These are demo tools with canned data, enough to drive the agent loop
//! end to end without network access:
//!
//! - `calculator`: evaluates arithmetic expressions
//! - `get_weather`: canned weather for a city
//! - `search_web`: canned search results, returned directly to the caller

pub mod calculator;
pub mod search;
pub mod weather;

use incant_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use search::SearchTool;
pub use weather::WeatherTool;

/// Create a registry holding every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register_tool(CalculatorTool);
    registry.register_tool(WeatherTool);
    registry.register_tool(SearchTool);
    registry
}
