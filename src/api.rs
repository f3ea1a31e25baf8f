use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::analyze::scoring::SortMethod;
use crate::cache::SourceCache;
use crate::ingest::types::ContentItem;
use crate::refresh::Refresher;
use crate::render::Renderer;
use crate::views::{ranked_view_name, Dashboard};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub refresher: Refresher,
    pub source_cache: Arc<SourceCache<ContentItem>>,
    pub renderer: Arc<dyn Renderer>,
}

/// Public source name -> prefix of its ranked views.
fn view_prefix(source: &str) -> Option<&'static str> {
    match source {
        "arxiv" => Some("arxiv"),
        "hackernews" => Some("hn"),
        _ => None,
    }
}

impl AppState {

    /// Drop both cache tiers.
    pub fn clear_caches(&self) {
        self.dashboard.clear();
        self.source_cache.invalidate_all();
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/clear-cache", get(clear_cache))
        .route("/cache-status", get(cache_status))
        .route("/refresh-cache", get(refresh_cache))
        .route("/api/{source}/{method}", get(api_ranked))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    let sections = state.dashboard.snapshot().await;
    match state.renderer.render(&sections) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(target: "api", error = ?e, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render dashboard").into_response()
        }
    }
}

async fn clear_cache(State(state): State<AppState>) -> String {
    match std::panic::catch_unwind(AssertUnwindSafe(|| state.clear_caches())) {
        Ok(()) => {
            tracing::info!(target: "api", "cache cleared");
            "Cache cleared successfully!".to_string()
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::error!(target: "api", error = %msg, "cache clear failed");
            format!("Failed to clear cache: {msg}")
        }
    }
}

async fn cache_status(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    Json(state.dashboard.status())
}

async fn refresh_cache(State(state): State<AppState>) -> &'static str {
    // detached; the periodic loop keeps running
    drop(state.refresher.spawn_one_shot());
    tracing::info!(target: "api", "manual refresh started");
    "Cache refresh started"
}

fn api_error(status: StatusCode, msg: String) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "status": "error", "error": msg, "items": [] })),
    )
}

async fn api_ranked(
    State(state): State<AppState>,
    Path((source, method)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    let Some(prefix) = view_prefix(&source) else {
        return api_error(StatusCode::NOT_FOUND, format!("unknown source: {source}"));
    };
    let method = match method.parse::<SortMethod>() {
        Ok(m) => m,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.dashboard.view(&ranked_view_name(prefix, method)).await {
        Ok(items) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "source": source,
                "method": method,
                "items": items,
            })),
        ),
        Err(e) => {
            tracing::error!(target: "api", %source, %method, error = ?e, "ranked view unavailable");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
