use std::sync::Arc;

use anyhow::Context;
use backend::{
    api,
    config::AppConfig,
    source::{LiveSourceClient, PriceSource},
    state::AppState,
};
use common::logger::init_logger;
use market::CityTable;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Live client when a URL is configured; `None` runs purely synthetic.
fn setup_price_source(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn PriceSource>>> {
    let Some(url) = cfg.live_source_url.clone() else {
        tracing::info!("no live source configured; synthetic prices only");
        return Ok(None);
    };

    let client = LiveSourceClient::new(url, cfg.live_source_timeout)
        .context("failed to build live source client")?;
    tracing::info!(url = %client.url(), "live source enabled");

    Ok(Some(Arc::new(client)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    init_logger("price-server", cfg.json_logs);

    tracing::info!("Starting price server...");

    let source = setup_price_source(&cfg)?;
    let state = AppState::new(cfg, CityTable::default(), source, StdRng::from_os_rng());

    let (ticks, regimes) = state
        .scheduler
        .spawn(state.config.tick_interval, state.config.regime_interval);

    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, cities = state.cities.len(), "listening");

    axum::serve(listener, api::router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    ticks.abort();
    regimes.abort();

    Ok(())
}
