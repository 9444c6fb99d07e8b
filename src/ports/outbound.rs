//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};

/// String-keyed persistent store. The browser-local storage model: flat keys,
/// string values, whole-value overwrite.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Raw value under `key`. `Ok(None)` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Overwrite `key`. Fails with `DomainError::StorageWrite` if the backend refuses.
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Overwrite several keys as one unit: either every entry lands or none does.
    async fn set_many(&self, entries: &[(String, String)]) -> Result<(), DomainError>;
}

/// Wall clock. Millisecond precision, the resolution stored timestamps keep.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
