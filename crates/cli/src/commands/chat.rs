//! `lodestar chat` — one coordinator turn from the terminal.

use chrono::Utc;
use lodestar_agent::context::{ContextAssembler, format_snapshot};
use lodestar_agent::orchestrator::Coordinator;
use lodestar_config::AppConfig;
use lodestar_core::identity::UserId;

pub async fn run(
    config: AppConfig,
    message: &str,
    user: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = lodestar_providers::build_from_config(&config)?;
    let (queries, executor) = super::open_store(&config).await?;

    let coordinator = Coordinator::new(provider, &config.agent.model)
        .with_temperature(config.agent.temperature)
        .with_max_tokens(config.agent.max_tokens)
        .with_history_budget(config.agent.history_token_budget)
        .with_executor(executor);
    let assembler = ContextAssembler::new(queries);

    let user = UserId::from(user);
    let snapshot = assembler.assemble(&user, Utc::now()).await;
    let context = format_snapshot(&snapshot);

    let outcome = coordinator
        .respond(&user, &[], message, Some(&context))
        .await?;

    println!("{}", outcome.response);

    if !outcome.tool_calls.is_empty() {
        println!();
        for result in &outcome.tool_calls {
            match &result.error {
                None => println!("  [ok]   {}", result.tool),
                Some(error) => println!("  [fail] {} — {}", result.tool, error),
            }
        }
    }

    Ok(())
}
