//! `lodestar serve` — start the HTTP gateway.

use lodestar_config::AppConfig;
use tracing::info;

pub async fn run(mut config: AppConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.gateway.port = port;
    }

    info!(
        backend = %config.store.backend,
        model = %config.agent.model,
        "Starting gateway"
    );

    if config.effective_api_key().is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    LODESTAR_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    lodestar_gateway::start(config).await
}
