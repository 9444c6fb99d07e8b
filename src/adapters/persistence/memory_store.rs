//! Implements KvStore in process memory.
//!
//! Optional byte quota (sum of key and value lengths) reproduces the
//! quota-exceeded failures of a browser origin's storage.

use crate::domain::DomainError;
use crate::ports::KvStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn usage_after(map: &HashMap<String, String>, entries: &[(String, String)]) -> usize {
        let mut usage: usize = map
            .iter()
            .filter(|(k, _)| !entries.iter().any(|(ek, _)| ek == *k))
            .map(|(k, v)| k.len() + v.len())
            .sum();
        for (k, v) in entries {
            usage += k.len() + v.len();
        }
        usage
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.set_many(&[(key.to_string(), value.to_string())]).await
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), DomainError> {
        let mut map = self.entries.write().await;
        if let Some(quota) = self.quota_bytes {
            let usage = Self::usage_after(&map, entries);
            if usage > quota {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                return Err(DomainError::storage_write(
                    keys.join(","),
                    format!("quota exceeded ({} > {} bytes)", usage, quota),
                ));
            }
        }
        for (k, v) in entries {
            map.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}
