//! Authenticated identity.
//!
//! The gateway resolves every request to a verified `UserId` before any core
//! component runs. The core trusts this value completely and never accepts a
//! user identity from model output or from the request body.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An opaque, verified user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Verifies bearer credentials and yields the user they belong to.
///
/// Token issuance and verification mechanics (JWT, sessions, ...) live
/// outside this system; implementations adapt whatever the deployment uses.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, bearer_token: &str) -> Result<UserId, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display() {
        let id = UserId::from("user-42");
        assert_eq!(id.to_string(), "user-42");
        assert_eq!(id.as_str(), "user-42");
    }
}
