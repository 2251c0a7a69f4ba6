mod config;
mod db;
mod errors;
mod export;
mod extract;
mod history;
mod models;
mod routes;
mod state;
mod tailoring;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::export::{default_page_setup, ExportRenderer};
use crate::history::remote::{PgRemoteHistory, RemoteHistory};
use crate::history::slot::RedisSlot;
use crate::history::HistoryStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tailoring::flow::FlowTracker;
use crate::tailoring::TailoringClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Tailoring client: endpoint problems surface here, before any request
    let tailor = TailoringClient::new(Some(&config.tailor_endpoint_url), config.tailor_timeout)
        .context("Invalid TAILOR_ENDPOINT_URL")?;
    info!(
        "Tailoring client initialized (endpoint: {}, timeout: {:?})",
        tailor.endpoint(),
        config.tailor_timeout
    );

    // Durable history slot (Redis)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let slot = Arc::new(RedisSlot::new(redis, config.history_key.clone()));
    info!("Redis history slot initialized (key: {})", config.history_key);

    // Optional remote-backed history (PostgreSQL)
    let remote: Option<Arc<dyn RemoteHistory>> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Some(Arc::new(PgRemoteHistory::new(pool)) as Arc<dyn RemoteHistory>)
        }
        None => {
            info!("DATABASE_URL not set, history is local-only");
            None
        }
    };

    let state = AppState {
        tailor,
        flows: FlowTracker::default(),
        history: HistoryStore::new(slot, remote),
        exporter: ExportRenderer::new(default_page_setup()),
        max_upload_bytes: config.max_upload_bytes,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
