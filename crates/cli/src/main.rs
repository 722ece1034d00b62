//! Incant CLI: the main entry point.
//!
//! Commands:
//! - `chat`       : Interactive chat session with memory
//! - `ask`        : Send a single message and print the answer
//! - `tools`      : List the built-in tools
//! - `config`     : Show, locate or initialize the configuration
//! - `completions`: Generate shell completions

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(
    name = "incant",
    about = "Incant: a minimal tool-calling agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging and show tool invocations
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent interactively
    Chat,

    /// Send a single message and print the answer
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,
    },

    /// List the available tools
    Tools,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a starter configuration file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run(cli.verbose).await?,
        Commands::Ask { message } => commands::ask::run(&message, cli.verbose).await?,
        Commands::Tools => commands::tools::run(),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show()?,
            ConfigAction::Path => commands::config_cmd::path(),
            ConfigAction::Init => commands::config_cmd::init()?,
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "incant", &mut std::io::stdout());
        }
    }

    Ok(())
}
