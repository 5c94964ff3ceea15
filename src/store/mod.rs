//! Key-value collaborator for the session token and local caches.
//!
//! Entries may carry an absolute expiry. An entry whose `expires_at <= now`
//! is reported as absent by every read, whether or not it has been purged.

pub mod error;
pub mod file;
pub mod memory;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::UnixMillis;

pub use error::StoreError;
pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use session::SessionTokens;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: Value,
    #[serde(default)]
    pub expires_at: Option<UnixMillis>,
}

impl StoredEntry {
    pub fn new(value: Value, ttl_ms: Option<i64>, now: UnixMillis) -> Result<Self, StoreError> {
        let expires_at = match ttl_ms {
            Some(ttl) if ttl < 0 => return Err(StoreError::InvalidTtl(ttl)),
            Some(ttl) => Some(now.saturating_add(ttl)),
            None => None,
        };
        Ok(Self { value, expires_at })
    }

    pub fn is_live(&self, now: UnixMillis) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str, now: UnixMillis) -> Result<Option<Value>, StoreError>;

    async fn put(
        &self,
        key: &str,
        value: Value,
        ttl_ms: Option<i64>,
        now: UnixMillis,
    ) -> Result<(), StoreError>;

    /// Returns whether a live or expired entry was present.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    async fn purge_expired(&self, now: UnixMillis) -> Result<usize, StoreError>;
}
