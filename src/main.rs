mod app;
mod concept;
mod config;
mod playlist;
mod profile;
mod server;
mod spotify;
mod store;

use anyhow::Result;
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{app::App, config::Config, store::RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("recomenfy=info"));
    fmt().with_env_filter(filter).init();

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Arc::new(Config::load()?);

    // ── Redis ────────────────────────────────────────────────────────────────
    let store = Arc::new(RedisStore::new(&config.redis_url)?);
    if store.ping().await {
        info!("Redis connected at {}", config.redis_url);
    } else {
        warn!("Redis not reachable at {}, logins and history will fail until it is", config.redis_url);
    }

    // ── Serve ────────────────────────────────────────────────────────────────
    let app = Arc::new(App::new(config.clone(), store)?);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    server::serve(app, addr).await
}
