use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;
use service::runtime;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}:{}: {e}", cfg.server.host, cfg.server.port)))
}

/// Prepare directories, open the configured stores and assemble the router.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    runtime::ensure_env(cfg)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;
    let stores = runtime::open_stores(cfg).await?;
    let state = AppState::new(stores, cfg);
    Ok(routes::build_router(state, build_cors(), &cfg.server.frontend_dir))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = bind_addr(&cfg)?;
    let app = build_app(&cfg).await?;

    info!(%addr, backend = ?cfg.storage.backend, "starting edu library server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
