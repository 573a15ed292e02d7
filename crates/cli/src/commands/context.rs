//! `lodestar context` — print the assembled context block for a user.
//!
//! Useful for eyeballing exactly what the model will see.

use chrono::Utc;
use lodestar_agent::context::{ContextAssembler, format_snapshot};
use lodestar_config::AppConfig;
use lodestar_core::identity::UserId;

pub async fn run(config: AppConfig, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (queries, _executor) = super::open_store(&config).await?;
    let assembler = ContextAssembler::new(queries);

    let snapshot = assembler.assemble(&UserId::from(user), Utc::now()).await;
    println!("{}", format_snapshot(&snapshot));
    Ok(())
}
