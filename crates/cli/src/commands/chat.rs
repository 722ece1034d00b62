//! `incant chat`: Interactive chat session.
//!
//! The session keeps its own in-memory history (unless `memory.enabled` is
//! false), so follow-up questions can refer to earlier turns.

use std::io::Write;
use std::sync::Arc;

use incant_core::event::EventBus;
use tokio::io::{AsyncBufReadExt, BufReader};

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

pub async fn run(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let events = verbose.then(|| Arc::new(EventBus::default()));
    if let Some(events) = &events {
        super::spawn_tool_printer(events);
    }
    let agent = super::build_agent(&config, events);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║         Incant Agent — Interactive Chat      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Protocol:  {}", config.protocol);
    println!("  Tools:     {}", config.tools.join(", "));
    println!(
        "  Memory:    {}",
        if config.memory.enabled { "on" } else { "off" }
    );
    println!();
    println!("  Try asking about the weather in London, then ask");
    println!("  \"what did I just ask about?\"");
    println!("  Type 'exit' or 'quit' to end.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if is_exit(input) {
            break;
        }
        if input.is_empty() {
            prompt()?;
            continue;
        }

        eprint!("  ...");
        match agent.run(input).await {
            Ok(response) => {
                eprint!("\r     \r");
                super::print_response(&response);
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
