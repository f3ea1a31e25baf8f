//! Trend Radar: binary entrypoint.
//! Loads config, wires providers and caches, starts the background refresher
//! and hands the Axum router to Shuttle.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_radar::clock::SystemClock;
use trend_radar::config::load_config_default;
use trend_radar::{app, build_state, Upstreams};

/// Structured logs; JSON lines when `TREND_RADAR_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trend_radar=info,warn"));
    let json = std::env::var("TREND_RADAR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    // Shuttle may have installed a subscriber already.
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default()?;
    tracing::info!(
        refresh_secs = cfg.refresh_interval_secs,
        fetch_timeout_secs = cfg.fetch_timeout_secs,
        max_results = cfg.max_results,
        "config loaded"
    );

    let upstreams = Upstreams::live(&cfg)?;
    let state = build_state(&cfg, upstreams, Arc::new(SystemClock));

    // Runs for the life of the process.
    state.refresher.spawn_periodic(cfg.refresh_interval());

    let router = app(&cfg, state);
    Ok(router.into())
}
