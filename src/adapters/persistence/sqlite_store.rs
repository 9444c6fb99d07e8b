//! SQLite-backed key-value store via libsql. Implements KvStore.
//!
//! Single `kv` table keyed by storage key; `set_many` runs in one transaction,
//! so multi-collection writes are all-or-nothing on disk.
//! Database file: data/store.db

use crate::domain::DomainError;
use crate::ports::KvStore;
use libsql::{Database, params};
use std::path::{Path, PathBuf};
use tracing::info;

const KV_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)"#;

const UPSERT: &str = r#"
INSERT INTO kv (key, value) VALUES (?1, ?2)
ON CONFLICT (key) DO UPDATE SET value = excluded.value
"#;

pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the database in `base_dir` and ensure the schema exists.
    /// Call once at startup; the store is safe to share via Arc.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Storage(e.to_string()))?;
        let db_path = base.join("store.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        // PRAGMA returns a row; consume it (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Storage(format!("WAL pragma failed: {}", e)))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .is_some()
        {}

        conn.execute(KV_TABLE, ())
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite store connected");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait::async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let mut rows = conn
            .query("SELECT value FROM kv WHERE key = ?1", params![key])
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
        {
            Some(row) => {
                let value: String = row.get(0).map_err(|e| DomainError::Storage(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::storage_write(key, e))?;
        conn.execute(UPSERT, params![key, value])
            .await
            .map_err(|e| DomainError::storage_write(key, e))?;
        Ok(())
    }

    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), DomainError> {
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        let keys = keys.join(",");
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::storage_write(&keys, e))?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::storage_write(&keys, e))?;
        for (key, value) in entries {
            tx.execute(UPSERT, params![key.as_str(), value.as_str()])
                .await
                .map_err(|e| DomainError::storage_write(key, e))?;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::storage_write(&keys, e))?;
        Ok(())
    }
}
