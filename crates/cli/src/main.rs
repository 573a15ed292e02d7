//! Lodestar CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `chat`    — Send one message through the coordinator from the terminal
//! - `context` — Print the assembled context block for a user

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "lodestar",
    about = "Lodestar — personal productivity coordinator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a single message through the coordinator
    Chat {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// User to act as
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Print the assembled context block for a user
    Context {
        /// User to assemble context for
        #[arg(short, long, default_value = "local")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = lodestar_config::AppConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat { message, user } => commands::chat::run(config, &message, &user).await?,
        Commands::Context { user } => commands::context::run(config, &user).await?,
    }

    Ok(())
}
