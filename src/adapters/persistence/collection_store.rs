//! Collections of records on top of a KvStore.
//!
//! Each collection is one JSON array under a fixed key. Reads never fail:
//! a missing key, a backend read error or unparsable content all come back as
//! an empty collection (logged). A single record that does not fit the schema
//! is carried as raw JSON and written back unchanged. Writes surface
//! `DomainError::StorageWrite`.

use crate::domain::{DomainError, Entity};
use crate::ports::KvStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed keys of the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Users,
    Internships,
    Applications,
    LastCleanup,
    DataInitialized,
}

impl StorageKey {
    pub const COLLECTIONS: [StorageKey; 3] = [Self::Users, Self::Internships, Self::Applications];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Internships => "internships",
            Self::Applications => "applications",
            Self::LastCleanup => "lastCleanup",
            Self::DataInitialized => "dataInitialized",
        }
    }
}

/// One stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stored<T> {
    Typed(T),
    /// Did not deserialize as `T`; kept verbatim.
    Opaque(Value),
}

/// A whole collection in stored order, including records that do not fit `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    entries: Vec<Stored<T>>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            entries: items.into_iter().map(Stored::Typed).collect(),
        }
    }
}

impl<T> Collection<T> {
    /// Records that fit the schema.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|e| match e {
            Stored::Typed(item) => Some(item),
            Stored::Opaque(_) => None,
        })
    }

    pub fn opaque(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().filter_map(|e| match e {
            Stored::Typed(_) => None,
            Stored::Opaque(raw) => Some(raw),
        })
    }

    pub fn find_mut(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<&mut T> {
        for entry in self.entries.iter_mut() {
            if let Stored::Typed(item) = entry {
                if pred(item) {
                    return Some(item);
                }
            }
        }
        None
    }

    pub fn push(&mut self, item: T) {
        self.entries.push(Stored::Typed(item));
    }

    /// Keep typed records matching `typed` and raw records matching `opaque`.
    pub fn retain(
        &mut self,
        mut typed: impl FnMut(&T) -> bool,
        mut opaque: impl FnMut(&Value) -> bool,
    ) {
        self.entries.retain(|e| match e {
            Stored::Typed(item) => typed(item),
            Stored::Opaque(raw) => opaque(raw),
        });
    }

    /// Number of records, raw ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_typed(self) -> Vec<T> {
        self.entries
            .into_iter()
            .filter_map(|e| match e {
                Stored::Typed(item) => Some(item),
                Stored::Opaque(_) => None,
            })
            .collect()
    }
}

impl<T: Entity> Collection<T> {
    /// Ids of every record. Raw records contribute their `id` key when it is a string.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match e {
            Stored::Typed(item) => Some(item.id()),
            Stored::Opaque(raw) => raw.get("id").and_then(Value::as_str),
        })
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids().any(|existing| existing == id)
    }
}

impl<T: Serialize> Serialize for Collection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

/// A serialized write waiting to be committed together with others.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    key: StorageKey,
    value: String,
}

#[derive(Clone)]
pub struct CollectionStore {
    kv: Arc<dyn KvStore>,
}

impl CollectionStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Create every missing collection as an empty array. Existing content is
    /// untouched; a key that cannot be read is an error, not "missing".
    pub async fn initialize(&self) -> Result<(), DomainError> {
        let mut missing = Vec::new();
        for key in StorageKey::COLLECTIONS {
            if self.kv.get(key.as_str()).await?.is_none() {
                missing.push((key.as_str().to_string(), "[]".to_string()));
            }
        }
        if !missing.is_empty() {
            debug!(count = missing.len(), "initializing empty collections");
            self.kv.set_many(&missing).await?;
        }
        Ok(())
    }

    /// Records of `key` that fit `T`.
    pub async fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Vec<T> {
        self.load(key).await.into_typed()
    }

    /// The full collection, for read-modify-write.
    pub async fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Collection<T> {
        let Some(raw) = self.read_scalar(key).await else {
            return Collection::default();
        };
        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "unreadable collection, using empty");
                return Collection::default();
            }
        };
        let entries: Vec<Stored<T>> = values
            .into_iter()
            .map(|v| {
                let parsed = <T as Deserialize<'_>>::deserialize(&v);
                match parsed {
                    Ok(item) => Stored::Typed(item),
                    Err(e) => {
                        warn!(key = key.as_str(), error = %e, "record does not fit schema, keeping it as is");
                        Stored::Opaque(v)
                    }
                }
            })
            .collect();
        let collection = Collection { entries };
        let opaque = collection.opaque().count();
        if opaque > 0 {
            warn!(
                key = key.as_str(),
                typed = collection.len() - opaque,
                opaque,
                "collection has records outside the schema"
            );
        }
        collection
    }

    pub async fn write<S: Serialize + ?Sized>(
        &self,
        key: StorageKey,
        value: &S,
    ) -> Result<(), DomainError> {
        let staged = Self::stage(key, value)?;
        self.kv.set(staged.key.as_str(), &staged.value).await
    }

    pub fn stage<S: Serialize + ?Sized>(key: StorageKey, value: &S) -> Result<StagedWrite, DomainError> {
        let value =
            serde_json::to_string(value).map_err(|e| DomainError::storage_write(key.as_str(), e))?;
        Ok(StagedWrite { key, value })
    }

    pub fn stage_scalar(key: StorageKey, value: impl Into<String>) -> StagedWrite {
        StagedWrite {
            key,
            value: value.into(),
        }
    }

    /// Write all staged values in one backend call; none land if it fails.
    pub async fn commit(&self, writes: Vec<StagedWrite>) -> Result<(), DomainError> {
        let entries: Vec<(String, String)> = writes
            .into_iter()
            .map(|w| (w.key.as_str().to_string(), w.value))
            .collect();
        self.kv.set_many(&entries).await
    }

    pub async fn read_scalar(&self, key: StorageKey) -> Option<String> {
        match self.kv.get(key.as_str()).await {
            Ok(v) => v,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "store read failed");
                None
            }
        }
    }

    pub async fn write_scalar(&self, key: StorageKey, value: &str) -> Result<(), DomainError> {
        self.kv.set(key.as_str(), value).await
    }
}
