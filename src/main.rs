//! Wiring & DI. Entry point: load config, open the configured store, build the repository.
//! No business logic here; the retention sweep runs inside `DataService::open`.

use dotenv::dotenv;
use intern_match::adapters::SystemClock;
use intern_match::adapters::persistence::{JsonFileStore, MemoryStore, SqliteStore};
use intern_match::ports::{Clock, KvStore};
use intern_match::shared::{AppConfig, StorageBackend};
use intern_match::usecases::{DataService, seed_demo_data};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be loaded, using defaults");
        AppConfig::default()
    });
    let backend = cfg.backend().map_err(|e| anyhow::anyhow!(e))?;
    let data_dir = cfg.data_dir_or_default();

    // --- Store ---
    let kv: Arc<dyn KvStore> = match backend {
        StorageBackend::Memory => {
            warn!("memory backend: nothing survives this process");
            let store = match cfg.storage_quota_bytes {
                Some(quota) => MemoryStore::with_quota(quota),
                None => MemoryStore::new(),
            };
            Arc::new(store)
        }
        StorageBackend::Json => Arc::new(
            JsonFileStore::open(data_dir.join("store.json"))
                .await
                .map_err(|e| anyhow::anyhow!("JSON store open failed: {}", e))?,
        ),
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::connect(&data_dir)
                .await
                .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
        ),
    };
    info!(?backend, path = %data_dir.display(), "storage backend ready");

    // --- Repository (initializes collections, sweeps if due) ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = DataService::open(kv, clock, cfg.retention_policy())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    if cfg.seed_demo_data_or_default() && seed_demo_data(&service).await? {
        info!("demo data seeded");
    }

    let last_cleanup = service
        .last_cleanup()
        .await
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    info!(
        users = service.get_all_users().await.len(),
        internships = service.get_all_internships().await.len(),
        applications = service.get_all_applications().await.len(),
        last_cleanup = %last_cleanup,
        "store summary"
    );

    Ok(())
}
