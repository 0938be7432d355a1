//! Key-value persistence for canonical advisory records.
//!
//! The store is a thin namespaced facade: records are serialized as JSON and
//! written under `<prefix>/<oid>`. Writes overwrite, so a reload pass swaps
//! each advisory atomically without a separate delete step and without
//! per-key growth. Communication failures propagate to the caller; no layer
//! below the feed loader retries.

use crate::error::Result;
use crate::models::CanonicalRecord;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::instrument;

/// Default namespace prefix for advisory keys.
pub const DEFAULT_KEY_PREFIX: &str = "internal/notus/advisories";

#[async_trait]
pub trait AdvisoryStore: Send + Sync {
    /// Persist `record` under the advisory's oid, replacing any previous value.
    async fn store_advisory(&self, oid: &str, record: &CanonicalRecord) -> Result<()>;
    /// True iff a record is stored for `oid`.
    async fn exists(&self, oid: &str) -> Result<bool>;
    /// The current record for `oid`, or `None` if absent.
    async fn get_advisory(&self, oid: &str) -> Result<Option<CanonicalRecord>>;
    /// All oids currently present under the namespace prefix, unordered.
    async fn get_keys(&self) -> Result<Vec<String>>;
    /// Stamp the completion time of a reload pass.
    async fn mark_reloaded(&self) -> Result<()>;
    /// RFC 3339 time of the last completed reload pass, if any.
    async fn last_reload(&self) -> Result<Option<String>>;
}

/// Redis-backed advisory store.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn advisory_key(&self, oid: &str) -> String {
        format!("{}/{}", self.prefix, oid)
    }

    fn meta_key(&self) -> String {
        // No slash separator, so the key falls outside the `<prefix>/*` scan.
        format!("{}:meta", self.prefix)
    }
}

#[async_trait]
impl AdvisoryStore for RedisStore {
    #[instrument(skip(self, record))]
    async fn store_advisory(&self, oid: &str, record: &CanonicalRecord) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(record)?;
        conn.set::<_, _, ()>(self.advisory_key(oid), json).await?;
        Ok(())
    }

    async fn exists(&self, oid: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.exists(self.advisory_key(oid)).await?)
    }

    async fn get_advisory(&self, oid: &str) -> Result<Option<CanonicalRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let data: Option<String> = conn.get(self.advisory_key(oid)).await?;
        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pattern = format!("{}/*", self.prefix);
        let mut oids = Vec::new();
        let mut iter: redis::AsyncIter<String> = conn.scan_match(pattern).await?;
        while let Some(key) = iter.next_item().await {
            if let Some(oid) = key.rsplit('/').next() {
                oids.push(oid.to_string());
            }
        }
        Ok(oids)
    }

    async fn mark_reloaded(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(self.meta_key(), chrono::Utc::now().to_rfc3339())
            .await?;
        Ok(())
    }

    async fn last_reload(&self) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.get(self.meta_key()).await?)
    }
}

/// In-process advisory store for tests and embedders without a Redis instance.
///
/// Values round-trip through JSON so the serialization contract matches
/// [`RedisStore`] exactly.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    last_reload: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdvisoryStore for MemoryStore {
    async fn store_advisory(&self, oid: &str, record: &CanonicalRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(oid.to_string(), json);
        Ok(())
    }

    async fn exists(&self, oid: &str) -> Result<bool> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(oid))
    }

    async fn get_advisory(&self, oid: &str) -> Result<Option<CanonicalRecord>> {
        let json = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(oid)
            .cloned();
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn get_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }

    async fn mark_reloaded(&self) -> Result<()> {
        *self.last_reload.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(chrono::Utc::now().to_rfc3339());
        Ok(())
    }

    async fn last_reload(&self) -> Result<Option<String>> {
        Ok(self
            .last_reload
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}
