//! Subcommand implementations and the wiring they share.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod tools;

use std::sync::Arc;

use incant_agent::Agent;
use incant_config::AppConfig;
use incant_core::agent::AgentConfig;
use incant_core::event::{DomainEvent, EventBus};
use incant_memory::BufferMemory;
use incant_providers::GeminiBackend;
use serde_json::Value;

/// Load the configuration and refuse to continue without an API key.
pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY=...   (recommended)");
        eprintln!("    INCANT_API_KEY=...   (takes priority)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// Assemble an agent from configuration.
///
/// The conversation store is created here, so its lifetime is that of the
/// returned agent: one chat session, or one `ask`.
pub fn build_agent(config: &AppConfig, events: Option<Arc<EventBus>>) -> Agent {
    let mut backend = GeminiBackend::new(config.api_key.clone().unwrap_or_default(), &config.model)
        .with_protocol(config.protocol);
    if let Some(url) = &config.api_url {
        backend = backend.with_base_url(url);
    }
    if let Some(prompt) = &config.system_prompt {
        backend = backend.with_system_prompt(prompt);
    }

    let registry = Arc::new(incant_tools::default_registry());
    let mut agent = AgentConfig::new(Arc::new(backend))
        .with_tools(registry, config.tools.iter().cloned())
        .with_protocol(config.protocol.build());

    if config.memory.enabled {
        agent = agent.with_store(Arc::new(BufferMemory::new()));
    }
    if let Some(max) = config.max_iterations {
        agent = agent.with_max_iterations(max);
    }
    if let Some(events) = events {
        agent = agent.with_events(events);
    }

    Agent::new(agent)
}

/// Print each tool invocation to stderr as it happens.
pub fn spawn_tool_printer(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let DomainEvent::ToolInvoked {
                tool_name,
                arguments,
                found,
                duration_ms,
                ..
            } = event.as_ref()
            {
                let args = Value::Object(arguments.clone());
                if *found {
                    eprintln!("  [Tool Called] {tool_name} with {args} ({duration_ms}ms)");
                } else {
                    eprintln!("  [Unknown Tool] {tool_name} with {args}");
                }
            }
        }
    });
}

/// How an answer should be shown to the user.
#[derive(Debug, PartialEq)]
pub enum Rendered {
    /// Structured output returned directly by a tool, pretty-printed
    Direct(String),
    /// An ordinary model answer
    Text(String),
}

/// Answers that parse as a JSON object, array or string came straight from
/// a `return_direct` tool and are pretty-printed.
pub fn render_response(response: &str) -> Rendered {
    match serde_json::from_str::<Value>(response) {
        Ok(value @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => {
            Rendered::Direct(serde_json::to_string_pretty(&value).unwrap_or_else(|_| response.to_string()))
        }
        _ => Rendered::Text(response.to_string()),
    }
}

pub fn print_response(response: &str) {
    match render_response(response) {
        Rendered::Direct(pretty) => {
            println!();
            println!("  Agent (Direct Tool Output) >");
            for line in pretty.lines() {
                println!("    {line}");
            }
            println!();
        }
        Rendered::Text(text) => {
            println!();
            for line in text.lines() {
                println!("  Agent > {line}");
            }
            println!();
        }
    }
}
