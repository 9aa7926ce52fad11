//! In-process TTL cache.
//!
//! Suitable for single-process deployments and tests; multi-worker
//! deployments share the Postgres-backed cache from `mealscan-db`
//! instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use mealscan_core::error::CoreError;
use mealscan_core::ports::Cache;

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<(String, String), (serde_json::Value, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        let map_key = (namespace.to_string(), key.to_string());

        {
            let entries = self.entries.read().await;
            match entries.get(&map_key) {
                Some((value, expires_at)) if *expires_at > Instant::now() => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {} // expired, fall through to lazy delete
                None => return Ok(None),
            }
        }

        self.entries.write().await.remove(&map_key);
        Ok(None)
    }

    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CoreError> {
        let expires_at = Instant::now() + ttl;
        self.entries.write().await.insert(
            (namespace.to_string(), key.to_string()),
            (value.clone(), expires_at),
        );
        Ok(())
    }
}
