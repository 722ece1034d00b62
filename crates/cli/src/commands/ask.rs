//! `incant ask`: Send one message and print the answer.

use std::sync::Arc;

use incant_core::event::EventBus;

pub async fn run(message: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let events = verbose.then(|| Arc::new(EventBus::default()));
    if let Some(events) = &events {
        super::spawn_tool_printer(events);
    }
    let agent = super::build_agent(&config, events);

    eprint!("  Thinking...");
    let result = agent.run(message).await;
    eprint!("\r              \r");

    super::print_response(&result?);
    Ok(())
}
