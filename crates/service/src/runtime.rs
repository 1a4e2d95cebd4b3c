//! Runtime environment helpers
//!
//! Thin wrappers so binary crates can prepare directories and open the
//! configured record stores without depending on `common` or `models`.

use configs::{AppConfig, StorageBackend};
use tracing::info;

use crate::storage::Stores;

/// Ensure expected directories exist; warn on missing optional ones.
pub async fn ensure_env(cfg: &AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.server.frontend_dir, &cfg.storage.data_dir, &cfg.storage.upload_dir).await
}

/// Open one store per collection on the configured backend.
pub async fn open_stores(cfg: &AppConfig) -> anyhow::Result<Stores> {
    match cfg.storage.backend {
        StorageBackend::Json => {
            let stores = Stores::json(&cfg.storage.data_dir).await?;
            info!(backend = "json", data_dir = %cfg.storage.data_dir, "record stores opened");
            Ok(stores)
        }
        StorageBackend::Database => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            models::db::migrate(&db).await?;
            info!(backend = "database", "record stores opened");
            Ok(Stores::sql(db))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordStore;

    #[tokio::test]
    async fn json_backend_lives_under_data_dir() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let mut cfg = AppConfig::default();
        cfg.storage.data_dir = root.path().join("data").display().to_string();
        cfg.storage.upload_dir = root.path().join("uploads").display().to_string();
        cfg.server.frontend_dir = root.path().join("frontend").display().to_string();
        ensure_env(&cfg).await?;

        let stores = open_stores(&cfg).await?;
        stores.tickets.save(&Default::default()).await?;
        assert!(root.path().join("data").join("tickets.json").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn database_backend_migrates_on_open() -> anyhow::Result<()> {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackend::Database;
        cfg.database.url = "sqlite::memory:".into();
        cfg.database.max_connections = 1;
        cfg.database.min_connections = 1;
        cfg.database.connect_timeout_secs = 5;
        cfg.database.acquire_timeout_secs = 5;
        let stores = open_stores(&cfg).await?;
        assert!(stores.users.load().await?.is_empty());
        Ok(())
    }
}
