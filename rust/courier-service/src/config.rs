use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use courier_core::{SearchMode, SessionConfig};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Map loaded at boot, stretched onto the canvas.
    pub map_path: Option<PathBuf>,
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("COURIER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("COURIER_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let map_path = env::var("COURIER_MAP").ok().map(PathBuf::from);

        let mut session = SessionConfig::default();
        if let Ok(mode) = env::var("COURIER_SEARCH_MODE") {
            session.search.mode = mode.parse::<SearchMode>().map_err(|e| anyhow!(e))?;
        }
        if let Ok(tick) = env::var("COURIER_TICK_MS") {
            session.tick_ms = tick.parse().with_context(|| format!("COURIER_TICK_MS={tick}"))?;
        }
        session.seed = env::var("COURIER_SEED").ok().and_then(|s| s.parse::<u64>().ok());

        Ok(Self { host, port, map_path, session })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
