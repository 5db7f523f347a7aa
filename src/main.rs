//! Football Dashboard API — Binary Entrypoint
//! Boots the Axum HTTP server: fixture feeds under /api/*, Prometheus
//! exposition under /metrics, static dashboard for everything else.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fussball_dashboard::api::{self, AppState};
use fussball_dashboard::clock::SystemClock;
use fussball_dashboard::config::AppConfig;
use fussball_dashboard::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fussball_dashboard=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    let metrics = Metrics::init();

    let state = AppState::new(&config, Arc::new(SystemClock));
    let router = api::create_router(state, &config.web_dir).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, web_dir = %config.web_dir.display(), "serving dashboard API");
    axum::serve(listener, router).await
}
