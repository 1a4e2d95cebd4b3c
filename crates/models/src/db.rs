use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use migration::MigratorTrait;
use tracing::info;

pub use configs::DatabaseConfig;

/// Connect using the workspace database settings.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .sqlx_logging(cfg.sqlx_logging);
    // every pooled connection to `sqlite::memory:` would be its own database
    if cfg.url.contains(":memory:") {
        opts.max_connections(1).min_connections(1);
    }
    let db = Database::connect(opts).await?;
    Ok(db)
}

/// Connect to a bare URL with default pool settings.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig {
        url: url.to_string(),
        max_connections: 10,
        min_connections: 1,
        connect_timeout_secs: 30,
        idle_timeout_secs: 600,
        acquire_timeout_secs: 30,
        sqlx_logging: false,
    };
    connect_with_config(&cfg).await
}

/// Apply pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
    migration::Migrator::up(db, None).await?;
    info!(event = "migrations_applied", "database schema up to date");
    Ok(())
}
