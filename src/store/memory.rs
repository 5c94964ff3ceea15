use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    store::{KeyValueStore, StoreError, StoredEntry},
    types::UnixMillis,
};

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, StoredEntry>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str, now: UnixMillis) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: Value,
        ttl_ms: Option<i64>,
        now: UnixMillis,
    ) -> Result<(), StoreError> {
        let entry = StoredEntry::new(value, ttl_ms, now)?;
        self.entries.lock().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn purge_expired(&self, now: UnixMillis) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }
}
