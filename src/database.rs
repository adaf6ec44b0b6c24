//! # Redis
//!
//! Key-value layer.
//!
//! Core purpose is to persist flat, write-once records and hand back whole
//! prefixes for aggregation and export.
//!
//! ## Requirements
//!
//! - Records are JSON objects keyed `<kind>:<timestamp>:<uuid>`
//! - Three kinds: `contact:`, `signup:`, `visit:`
//! - Records are never updated or deleted once written
//! - Prefix reads load everything at once, dataset is marketing-site sized
//!
//! ## Implementation
//!
//! - One value per record, serialized with serde_json
//! - Prefix scan is `KEYS <prefix>*` then `MGET`, order is store-defined
//! - Individual writes are serialized by Redis itself, no transactions needed
//!
//! [`MemoryStore`] backs the tests and local runs without a Redis container.
use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("malformed stored record: {0}")]
    Json(#[from] serde_json::Error),
}

/// The namespaced string-to-JSON store every handler writes through.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError>;
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Some(Duration::from_millis(100)));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let payload = serde_json::to_string(&value)?;

        let _: () = connection.set(key, payload).await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut connection = self.connection.clone();
        let payload: Option<String> = connection.get(key).await?;

        payload
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError> {
        let mut connection = self.connection.clone();

        let keys: Vec<String> = connection.keys(format!("{prefix}*")).await?;
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        // MGET with zero keys is a Redis error, hence the guard above.
        let payloads: Vec<Option<String>> = connection.mget(&keys).await?;

        let mut values = Vec::with_capacity(payloads.len());
        for payload in payloads.into_iter().flatten() {
            values.push(serde_json::from_str(&payload)?);
        }

        Ok(values)
    }
}

/// In-process store over a sorted map. Used by the tests and for running
/// the server locally without Redis.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>, StoreError> {
        let entries = self.entries.read().await;

        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{KvStore, MemoryStore};

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();

        store
            .set("contact:2026-01-01T00:00:00.000Z:abc", json!({"name": "a"}))
            .await
            .unwrap();

        let value = store
            .get("contact:2026-01-01T00:00:00.000Z:abc")
            .await
            .unwrap();
        assert_eq!(value, Some(json!({"name": "a"})));

        assert_eq!(store.get("contact:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn prefix_scan_stays_inside_prefix() {
        let store = MemoryStore::new();

        store.set("contact:1:a", json!(1)).await.unwrap();
        store.set("contact:2:b", json!(2)).await.unwrap();
        store.set("signup:1:c", json!(3)).await.unwrap();
        store.set("visit:1:d", json!(4)).await.unwrap();

        let contacts = store.get_by_prefix("contact:").await.unwrap();
        assert_eq!(contacts, vec![json!(1), json!(2)]);

        let signups = store.get_by_prefix("signup:").await.unwrap();
        assert_eq!(signups, vec![json!(3)]);
    }

    #[tokio::test]
    async fn empty_prefix_scan_is_empty() {
        let store = MemoryStore::new();

        assert!(store.get_by_prefix("visit:").await.unwrap().is_empty());
    }
}
