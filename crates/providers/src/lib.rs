//! LLM provider implementations for Lodestar.
//!
//! One implementation ships today: an OpenAI-compatible chat-completions
//! client, which covers OpenAI itself plus the long tail of compatible
//! endpoints (OpenRouter, Ollama, vLLM, ...).

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use lodestar_config::AppConfig;
use lodestar_core::error::ProviderError;
use lodestar_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.effective_api_key().ok_or_else(|| {
        ProviderError::NotConfigured(
            "No API key configured — set LODESTAR_API_KEY or provider.api_key".into(),
        )
    })?;

    Ok(Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.provider.api_url,
        api_key,
    )))
}
