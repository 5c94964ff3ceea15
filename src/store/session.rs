use std::sync::Arc;

use serde_json::Value;

use crate::{
    store::{KeyValueStore, StoreError},
    types::UnixMillis,
};

pub const SESSION_TOKEN_KEY: &str = "session.token";

/// Read/write contract for the auth token. Issuing and refreshing tokens is
/// someone else's job; this only remembers the latest one until it expires.
#[derive(Clone)]
pub struct SessionTokens {
    store: Arc<dyn KeyValueStore>,
    ttl_ms: Option<i64>,
}

impl SessionTokens {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl_ms: Option<i64>) -> Self {
        Self { store, ttl_ms }
    }

    pub async fn save_token(&self, token: &str, now: UnixMillis) -> Result<(), StoreError> {
        self.store
            .put(
                SESSION_TOKEN_KEY,
                Value::String(token.to_string()),
                self.ttl_ms,
                now,
            )
            .await
    }

    pub async fn load_token(&self, now: UnixMillis) -> Result<Option<String>, StoreError> {
        let value = self.store.get(SESSION_TOKEN_KEY, now).await?;
        Ok(value.and_then(|value| value.as_str().map(str::to_string)))
    }

    pub async fn clear_token(&self) -> Result<bool, StoreError> {
        self.store.remove(SESSION_TOKEN_KEY).await
    }
}
