//! Application configuration. Storage backend, paths, retention policy.

use crate::usecases::RetentionPolicy;
use crate::usecases::retention::{DEFAULT_CLEANUP_INTERVAL_DAYS, DEFAULT_RETENTION_MONTHS};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_DIR: &str = "./data";

/// Where collections are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process memory; gone at exit.
    Memory,
    /// One JSON file under the data dir.
    #[default]
    Json,
    /// libsql database under the data dir.
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            "sqlite" | "libsql" => Ok(Self::Sqlite),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory for the json/sqlite backends. Read from INTERN_MATCH_DATA_DIR.
    pub data_dir: Option<String>,

    /// memory | json | sqlite. Read from INTERN_MATCH_BACKEND.
    #[serde(default)]
    pub backend: Option<String>,

    /// Days between retention sweeps (default 7). Read from INTERN_MATCH_CLEANUP_INTERVAL_DAYS.
    #[serde(default)]
    pub cleanup_interval_days: Option<i64>,

    /// Months a closed internship is kept (default 6). Read from INTERN_MATCH_RETENTION_MONTHS.
    #[serde(default)]
    pub retention_months: Option<u32>,

    /// Byte quota for the memory backend, mimicking browser storage limits.
    #[serde(default)]
    pub storage_quota_bytes: Option<usize>,

    /// Seed demo startups, students and internships on first run. Read from INTERN_MATCH_SEED_DEMO_DATA.
    #[serde(default)]
    pub seed_demo_data: Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("INTERN_MATCH").try_parsing(true));
        if let Ok(path) = std::env::var("INTERN_MATCH_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))
    }

    /// Configured backend; `Err` names the unrecognized value.
    pub fn backend(&self) -> Result<StorageBackend, String> {
        match self.backend.as_deref() {
            Some(s) => s.parse(),
            None => Ok(StorageBackend::default()),
        }
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(
            self.cleanup_interval_days
                .unwrap_or(DEFAULT_CLEANUP_INTERVAL_DAYS),
            self.retention_months.unwrap_or(DEFAULT_RETENTION_MONTHS),
        )
    }

    pub fn seed_demo_data_or_default(&self) -> bool {
        self.seed_demo_data.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, TimeDelta};

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.backend().unwrap(), StorageBackend::Json);
        assert_eq!(cfg.data_dir_or_default(), PathBuf::from("./data"));
        let policy = cfg.retention_policy();
        assert_eq!(policy.cleanup_interval, TimeDelta::days(7));
        assert_eq!(policy.closed_retention, Months::new(6));
        assert!(!cfg.seed_demo_data_or_default());
    }

    #[test]
    fn test_backend_parsing() {
        let cfg = AppConfig {
            backend: Some("SQLite".into()),
            ..Default::default()
        };
        assert_eq!(cfg.backend().unwrap(), StorageBackend::Sqlite);

        let bad = AppConfig {
            backend: Some("redis".into()),
            ..Default::default()
        };
        assert!(bad.backend().is_err());
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig {
            cleanup_interval_days: Some(1),
            retention_months: Some(12),
            ..Default::default()
        };
        assert_eq!(cfg.retention_policy(), RetentionPolicy::new(1, 12));
    }
}
