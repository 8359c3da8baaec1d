use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use courier_service::config::Config;
use courier_service::{build_router, spawn, AppState, MapLayout};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env()?;
    let addr = cfg.addr()?;
    let driver = spawn(cfg.session.clone());

    if let Some(path) = &cfg.map_path {
        let bytes = std::fs::read(path).with_context(|| format!("reading map {}", path.display()))?;
        match driver.load_map(bytes, MapLayout::Canvas).await {
            Ok(view) => info!(map = %path.display(), columns = ?view.columns, rows = ?view.rows, "default map loaded"),
            Err(e) => warn!(map = %path.display(), error = %e, "default map rejected"),
        }
    }

    let app = build_router(AppState { driver });
    info!(core_version = %courier_core::version(), addr = %addr, "starting courier-service");
    let listener = tokio::net::TcpListener::bind(addr).await.context("bind failed")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
