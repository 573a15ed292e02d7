//! Configuration loading, validation, and management for Lodestar.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model API key (env: LODESTAR_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model to use for coordinator turns
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Token budget for trimmed conversation history
    #[serde(default = "default_history_budget")]
    pub history_token_budget: usize,

    /// Size of synthesized chunks on the tool-calling path, in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_token_budget: default_history_budget(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-provider API key override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token → user id. Stands in for a real identity provider in
    /// single-tenant deployments; production wires a JWT verifier instead.
    #[serde(default)]
    pub bearer_tokens: HashMap<String, String>,

    /// Allowed CORS origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_tokens: HashMap::new(),
            cors_origin: default_cors_origin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (ignored for the memory backend)
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_history_budget() -> usize {
    2000
}
fn default_chunk_size() -> usize {
    400
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8700
}
fn default_cors_origin() -> String {
    "http://localhost:3000".into()
}
fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    "lodestar.db".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("agent", &self.agent)
            .field("provider", &self.provider)
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment
    /// variable overrides. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)?
            }
            _ => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("LODESTAR_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("LODESTAR_MODEL") {
            if !model.is_empty() {
                self.agent.model = model;
            }
        }

        if let Ok(port) = std::env::var("LODESTAR_PORT") {
            if let Ok(port) = port.parse() {
                self.gateway.port = port;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::Invalid(format!(
                "agent.temperature must be in [0.0, 2.0], got {}",
                self.agent.temperature
            )));
        }
        if self.agent.chunk_size == 0 {
            return Err(ConfigError::Invalid("agent.chunk_size must be > 0".into()));
        }
        match self.store.backend.as_str() {
            "sqlite" | "memory" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "store.backend must be 'sqlite' or 'memory', got '{other}'"
                )));
            }
        }
        Ok(())
    }

    /// The effective model API key: provider override first, then global.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.provider
            .api_key
            .as_deref()
            .or(self.api_key.as_deref())
    }
}
