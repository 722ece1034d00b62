//! The agent loop implementation.

use chrono::Utc;
use incant_core::agent::AgentConfig;
use incant_core::error::{Error, Result};
use incant_core::event::DomainEvent;
use incant_core::message::Message;
use incant_core::protocol::Decoded;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The text reported to the backend when it calls a tool nobody registered.
///
/// Backends may be prompted to recognize this exact wording.
pub fn tool_not_found_message(name: &str) -> String {
    format!("Error: Tool '{name}' not found.")
}

/// An agent: a configuration plus the loop that runs it.
///
/// `Agent` holds no conversation state, so one instance can serve any number
/// of concurrent invocations.
#[derive(Debug, Clone)]
pub struct Agent {
    config: AgentConfig,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(events) = &self.config.events {
            events.publish(event);
        }
    }

    /// Turn one user input into a final answer.
    ///
    /// Unknown tools are reported back to the backend and the loop carries
    /// on. Backend, store and tool handler failures end the invocation with
    /// an error and nothing is saved.
    ///
    /// A `return_direct` tool ends the invocation with its output rendered
    /// as compact JSON, without consulting the backend again and without
    /// saving the exchange.
    pub async fn run(&self, input: &str) -> Result<String> {
        let config = &self.config;

        if config.max_iterations == Some(0) {
            return Err(Error::Config {
                message: "max_iterations must be greater than 0".into(),
            });
        }

        let mut turns = match &config.store {
            Some(store) => store.load().await?,
            None => Vec::new(),
        };
        let history_len = turns.len();
        turns.push(Message::user(input));

        let catalog = config.registry.catalog(&config.tools);

        info!(
            backend = config.backend.name(),
            protocol = %config.protocol.kind(),
            history = history_len,
            tools = catalog.len(),
            "Running agent"
        );
        self.publish(DomainEvent::InvocationStarted {
            history_len,
            tools_offered: catalog.len(),
            timestamp: Utc::now(),
        });

        let mut iteration: u32 = 0;

        loop {
            iteration += 1;

            if let Some(limit) = config.max_iterations
                && iteration > limit
            {
                warn!(limit, "Max backend calls reached without a final answer");
                return Err(Error::IterationLimit { limit });
            }

            debug!(iteration, turns = turns.len(), "Agent loop iteration");
            self.publish(DomainEvent::BackendCalled {
                backend: config.backend.name().to_string(),
                iteration,
                timestamp: Utc::now(),
            });

            let reply = config.backend.generate(&turns, &catalog).await?;

            let call = match config.protocol.decode(reply) {
                Decoded::FreeText(answer) => {
                    if let Some(store) = &config.store {
                        store.save(input, &answer).await?;
                    }
                    debug!(iteration, chars = answer.len(), "Final answer produced");
                    self.publish(DomainEvent::AnswerProduced {
                        direct: false,
                        iterations: iteration,
                        timestamp: Utc::now(),
                    });
                    return Ok(answer);
                }
                Decoded::ToolInvocation(call) => call,
            };

            turns.push(Message::tool_call(call.clone()));

            let Some(tool) = config.registry.lookup(&call.name) else {
                warn!(tool = %call.name, "Backend requested an unknown tool");
                self.publish(DomainEvent::ToolInvoked {
                    tool_name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    found: false,
                    duration_ms: 0,
                    timestamp: Utc::now(),
                });
                let diagnostic = tool_not_found_message(&call.name);
                turns.push(Message::tool_result(call, Value::String(diagnostic)));
                continue;
            };

            debug!(tool = %call.name, call_id = %call.id, "Invoking tool");
            let start = Instant::now();
            let output = tool.invoke(call.arguments.clone()).await.map_err(|e| {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                e
            })?;
            let duration_ms = start.elapsed().as_millis() as u64;

            self.publish(DomainEvent::ToolInvoked {
                tool_name: call.name.clone(),
                arguments: call.arguments.clone(),
                found: true,
                duration_ms,
                timestamp: Utc::now(),
            });

            if tool.return_direct() {
                debug!(tool = %call.name, "Returning tool output directly");
                self.publish(DomainEvent::AnswerProduced {
                    direct: true,
                    iterations: iteration,
                    timestamp: Utc::now(),
                });
                return Ok(serde_json::to_string(&output)?);
            }

            turns.push(Message::tool_result(call, output));

            // Loop back: the backend sees the tool result next.
        }
    }
}
