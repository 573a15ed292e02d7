//! Static profile source.
//!
//! The real profile fetcher is an external read-only service; this
//! implementation serves a fixed in-process table for wiring and tests.

use async_trait::async_trait;
use lodestar_core::error::StoreError;
use lodestar_core::identity::UserId;
use lodestar_core::store::ProfileSource;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct StaticProfileSource {
    profiles: RwLock<HashMap<UserId, BTreeMap<String, String>>>,
}

impl StaticProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_profile(&self, user: UserId, profile: BTreeMap<String, String>) {
        self.profiles.write().await.insert(user, profile);
    }
}

#[async_trait]
impl ProfileSource for StaticProfileSource {
    async fn fetch_profile(&self, user: &UserId) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}
