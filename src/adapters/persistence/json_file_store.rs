//! Implements KvStore using a single JSON file.
//!
//! The whole key space is kept in memory and rewritten on every change.

use crate::domain::DomainError;
use crate::ports::KvStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// JSON file-based key-value storage.
pub struct JsonFileStore {
    path: PathBuf,
    cache: tokio::sync::RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing content. A missing file is an
    /// empty store; an unreadable or corrupt one is logged and treated as empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DomainError::Storage(format!("create data dir: {}", e)))?;
            }
        }
        let data = match fs::read_to_string(&path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "store file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        info!(path = %path.display(), keys = data.len(), "opened JSON store");
        Ok(Self {
            path,
            cache: tokio::sync::RwLock::new(data),
        })
    }

    /// Atomic save using write-replace pattern.
    /// 1. Write to temp file
    /// 2. sync_all() to ensure flush to disk
    /// 3. Atomic rename to target path
    async fn save(&self, data: &BTreeMap<String, String>, key: &str) -> Result<(), DomainError> {
        let json =
            serde_json::to_string_pretty(data).map_err(|e| DomainError::storage_write(key, e))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::storage_write(key, format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::storage_write(key, format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::storage_write(key, format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::storage_write(key, format!("atomic rename failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.set_many(&[(key.to_string(), value.to_string())]).await
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), DomainError> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        for (k, v) in entries {
            next.insert(k.clone(), v.clone());
        }
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        // Memory only changes once the file is in place.
        self.save(&next, &keys.join(",")).await?;
        *cache = next;
        Ok(())
    }
}
