//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Input rejected before any write. Message names the first failing rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The underlying store refused the write (quota, I/O). Not retried.
    #[error("Failed to save data to {key}: {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    /// A referenced record (startup, student, internship) does not exist.
    #[error("Reference error: {0}")]
    Reference(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage_write(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::StorageWrite {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
