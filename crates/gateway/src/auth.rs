//! Bearer-token authentication for the gateway.
//!
//! The gateway itself never inspects token contents — it hands the bearer
//! string to the configured `IdentityProvider` and trusts the `UserId` it
//! returns. `StaticTokenIdentity` is the built-in implementation backed by
//! the config's token table; deployments with real auth wire their own.

use async_trait::async_trait;
use axum::http::HeaderMap;
use lodestar_core::error::AuthError;
use lodestar_core::identity::{IdentityProvider, UserId};
use std::collections::HashMap;

/// A fixed token → user table.
pub struct StaticTokenIdentity {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenIdentity {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .map(|(token, user)| (token, UserId(user)))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn authenticate(&self, bearer_token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(bearer_token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidToken)?;
    value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}
