// tests/api_http.rs
//
// HTTP-level tests for the public Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/{source}/{method}  (ok + unknown source/method)
// - GET /cache-status, /clear-cache, /refresh-cache
// - GET /            (HTML dashboard)
// - GET /metrics

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use trend_radar::clock::ManualClock;
use trend_radar::ingest::providers::{
    arxiv_atom::ArxivProvider, google_trends::TrendsProvider, hn_rss::HnRssProvider,
};
use trend_radar::{app, build_state, AppConfig, AppState, Upstreams};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const ARXIV_XML: &str = include_str!("fixtures/arxiv_atom.xml");
const HN_XML: &str = include_str!("fixtures/hn_frontpage.xml");
const TRENDS_XML: &str = include_str!("fixtures/google_trends.xml");

fn fixture_state(cfg: &AppConfig) -> AppState {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let upstreams = Upstreams {
        papers: Arc::new(ArxivProvider::from_fixture(ARXIV_XML)),
        stories: Arc::new(HnRssProvider::from_fixture(HN_XML)),
        trends: Arc::new(TrendsProvider::from_fixture(TRENDS_XML)),
    };
    build_state(cfg, upstreams, clock)
}

/// Build the same Router the binary uses, on fixtures.
fn test_app() -> (Router, AppState) {
    let cfg = AppConfig::default();
    let state = fixture_state(&cfg);
    (app(&cfg, state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, String::from_utf8(bytes).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = test_app();
    let (status, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn api_ranks_papers_by_recency() {
    let (app, _) = test_app();
    let (status, body) = get(app, "/api/arxiv/new").await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["status"], "ok");
    assert_eq!(v["source"], "arxiv");
    assert_eq!(v["method"], "new");
    let items = v["items"].as_array().expect("items array");
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["paper_id"], "2405.30001v1");
    assert_eq!(items[0]["url"], "http://arxiv.org/pdf/2405.30001v1");
    assert_eq!(items[2]["paper_id"], "2311.00003v1");
    assert!(items[0]["summary"].as_str().unwrap().ends_with("..."));
}

#[tokio::test]
async fn api_ranks_stories_with_display_fields() {
    let (app, _) = test_app();
    let (status, body) = get(app, "/api/hackernews/HOT").await;
    assert_eq!(status, StatusCode::OK);

    let v: Json = serde_json::from_str(&body).expect("json");
    assert_eq!(v["method"], "hot");
    let items = v["items"].as_array().expect("items array");
    assert_eq!(items.len(), 3);
    for it in items {
        let s = it["score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&s));
        assert!(it["by"].as_str().is_some_and(|b| !b.is_empty()));
    }
    let tiny = items
        .iter()
        .find(|i| i["title"] == "Show HN: A tiny Rust database")
        .expect("story present");
    assert_eq!(tiny["domain"], "github.com");
    assert_eq!(tiny["points"], 240);
    assert_eq!(tiny["time_ago"], "2 hours ago");
}

#[tokio::test]
async fn api_unknown_source_or_method_is_structured_error() {
    let (app, _) = test_app();
    let (status, body) = get(app.clone(), "/api/reddit/hot").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "error");
    assert!(v["error"].as_str().unwrap().contains("reddit"));
    assert_eq!(v["items"], serde_json::json!([]));

    let (status, body) = get(app, "/api/arxiv/controversial").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["status"], "error");
    assert_eq!(v["items"], serde_json::json!([]));
}

#[tokio::test]
async fn index_renders_every_section_and_fills_cache() {
    let (app, state) = test_app();
    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<!doctype html>"));
    for id in [
        "arxiv_hot",
        "arxiv_rising",
        "arxiv_new",
        "hn_hot",
        "hn_rising",
        "hn_new",
        "hn_insights",
        "google_trends",
    ] {
        assert!(body.contains(&format!(r#"<section id="{id}">"#)), "missing {id}");
    }
    assert!(body.contains("piala dunia"));

    let (status, body) = get(app, "/cache-status").await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v.as_object().unwrap().len(), 8);
    assert!(v.as_object().unwrap().values().all(|b| b == true));
    assert!(state.dashboard.cache().has("hn_insights"));
}

#[tokio::test]
async fn clear_cache_empties_status() {
    let (app, state) = test_app();
    get(app.clone(), "/").await;
    assert!(state.dashboard.cache().has("arxiv_hot"));

    let (status, body) = get(app.clone(), "/clear-cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Cache cleared successfully!");

    let (_, body) = get(app, "/cache-status").await;
    let v: Json = serde_json::from_str(&body).unwrap();
    assert!(v.as_object().unwrap().values().all(|b| b == false));
}

#[tokio::test]
async fn refresh_cache_returns_immediately() {
    let (app, state) = test_app();
    let (status, body) = get(app, "/refresh-cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Cache refresh started");

    // the detached sweep eventually fills the cache
    for _ in 0..200 {
        if state.dashboard.cache().has("google_trends") {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("background sweep never populated the cache");
}

#[tokio::test]
async fn api_reads_through_dashboard_cache() {
    let (app, state) = test_app();
    assert!(!state.dashboard.cache().has("arxiv_hot"));

    let (status, first) = get(app.clone(), "/api/arxiv/hot").await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.dashboard.cache().has("arxiv_hot"));
    assert!(!state.dashboard.cache().has("arxiv_new"));

    // served from the cached view even after the batch tier is dropped
    state.source_cache.invalidate_all();
    let (_, second) = get(app.clone(), "/api/arxiv/hot").await;
    assert_eq!(first, second);

    let (_, body) = get(app, "/cache-status").await;
    let v: Json = serde_json::from_str(&body).unwrap();
    assert_eq!(v["arxiv_hot"], true);
    assert_eq!(v["hn_hot"], false);
}

#[tokio::test]
async fn metrics_endpoint_exposes_cache_series() {
    let (app, _) = test_app();
    // miss, then a view hit, then a second view over the cached batch
    get(app.clone(), "/api/arxiv/hot").await;
    get(app.clone(), "/api/arxiv/hot").await;
    get(app.clone(), "/api/arxiv/rising").await;

    let (status, text) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "dashboard_cache_misses_total",
        "dashboard_cache_hits_total",
        "source_cache_hits_total",
        "provider_items_total",
    ] {
        assert!(text.contains(needle), "metrics output missing {needle}");
    }
}
