use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::{
    store::{KeyValueStore, StoreError, StoredEntry},
    types::UnixMillis,
};

const STORE_FORMAT_VERSION: u64 = 1;

/// JSON-file backed store. The whole map is rewritten on every mutation via
/// a synced temp file and a rename, so readers never see a torn file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    guard: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedStore {
    version: u64,
    entries: BTreeMap<String, StoredEntry>,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, StoredEntry>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let parsed: PersistedStore =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        if parsed.version != STORE_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: parsed.version,
                path: self.path.clone(),
            });
        }

        Ok(parsed.entries)
    }

    async fn save(&self, entries: BTreeMap<String, StoredEntry>) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::NoParent(self.path.clone()))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;

        let persisted = PersistedStore {
            version: STORE_FORMAT_VERSION,
            entries,
        };
        let tmp_path = self.path.with_extension("tmp");
        let mut bytes =
            serde_json::to_vec_pretty(&persisted).map_err(|source| StoreError::Serialize {
                path: tmp_path.clone(),
                source,
            })?;
        bytes.push(b'\n');

        let write_err = |source: std::io::Error| StoreError::Write {
            path: tmp_path.clone(),
            source,
        };
        let mut file = fs::File::create(&tmp_path).await.map_err(write_err)?;
        file.write_all(&bytes).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        if let Ok(parent_dir) = fs::File::open(parent).await {
            let _ = parent_dir.sync_all().await;
        }

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str, now: UnixMillis) -> Result<Option<Value>, StoreError> {
        let _guard = self.guard.lock().await;
        let entries = self.load().await?;
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
        let _guard = self.guard.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), entry);
        self.save(entries).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.load().await?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.save(entries).await?;
        }
        Ok(removed)
    }

    async fn purge_expired(&self, now: UnixMillis) -> Result<usize, StoreError> {
        let _guard = self.guard.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            self.save(entries).await?;
        }
        Ok(purged)
    }
}
