//! Cross-cutting configuration.

pub mod config;

pub use config::{AppConfig, StorageBackend};
