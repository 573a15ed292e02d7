pub mod chat;
pub mod context;
pub mod serve;

use lodestar_config::AppConfig;
use lodestar_core::store::ProductivityQueries;
use lodestar_store::{MemoryStore, SqliteStore};
use lodestar_tools::ToolExecutor;
use std::sync::Arc;

/// Open the configured store backend as (queries, executor).
pub(crate) async fn open_store(
    config: &AppConfig,
) -> Result<(Arc<dyn ProductivityQueries>, ToolExecutor), Box<dyn std::error::Error>> {
    Ok(match config.store.backend.as_str() {
        "memory" => {
            let store = Arc::new(MemoryStore::new());
            (
                store.clone() as Arc<dyn ProductivityQueries>,
                ToolExecutor::new()
                    .with_task_actions(store.clone())
                    .with_goal_actions(store.clone())
                    .with_milestone_actions(store),
            )
        }
        _ => {
            let store = Arc::new(SqliteStore::new(&config.store.path).await?);
            (
                store.clone() as Arc<dyn ProductivityQueries>,
                ToolExecutor::new()
                    .with_task_actions(store.clone())
                    .with_goal_actions(store.clone())
                    .with_milestone_actions(store),
            )
        }
    })
}
