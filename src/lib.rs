// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod format;
pub mod ingest;
pub mod metrics;
pub mod ranking;
pub mod refresh;
pub mod render;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;

use crate::cache::{DashboardCache, SourceCache};
use crate::clock::SharedClock;
use crate::ingest::providers::{
    arxiv_atom::{self, ArxivProvider},
    google_trends::{TrendsFeed, TrendsProvider},
    hn_rss::HnRssProvider,
};
use crate::ingest::types::{ContentItem, ItemSource};
use crate::ranking::{RankDomain, RankingPipeline};
use crate::refresh::Refresher;
use crate::render::HtmlRenderer;
use crate::views::{default_registry, Dashboard, Sources};

/// Raw upstream collaborators, before caching and ranking are layered on.
pub struct Upstreams {
    pub papers: Arc<dyn ItemSource>,
    pub stories: Arc<dyn ItemSource>,
    pub trends: Arc<dyn TrendsFeed>,
}

impl Upstreams {
    /// HTTP providers pointed at the configured feeds.
    pub fn live(cfg: &AppConfig) -> anyhow::Result<Self> {
        let client = ingest::http_client()?;
        let s = &cfg.sources;
        Ok(Self {
            papers: Arc::new(ArxivProvider::from_url(
                arxiv_atom::query_url(&s.arxiv_api_base, s.arxiv_max_results),
                client.clone(),
            )),
            stories: Arc::new(
                HnRssProvider::from_url(s.hn_feed_url.clone(), client.clone()).with_limit(s.hn_limit),
            ),
            trends: Arc::new(
                TrendsProvider::from_url(s.trends_url.clone(), client).with_limit(s.trends_limit),
            ),
        })
    }
}

/// Wire caches, pipelines, views and the refresher around `upstreams`.
pub fn build_state(cfg: &AppConfig, upstreams: Upstreams, clock: SharedClock) -> AppState {
    let source_cache: Arc<SourceCache<ContentItem>> =
        Arc::new(SourceCache::new(Arc::clone(&clock), cfg.fetch_timeout()));

    let sources = Sources {
        papers: Arc::new(RankingPipeline::new(
            RankDomain::papers(Duration::from_secs(cfg.sources.papers_ttl_secs)),
            upstreams.papers,
            Arc::clone(&source_cache),
            Arc::clone(&clock),
        )),
        stories: Arc::new(RankingPipeline::new(
            RankDomain::stories(Duration::from_secs(cfg.sources.stories_ttl_secs)),
            upstreams.stories,
            Arc::clone(&source_cache),
            Arc::clone(&clock),
        )),
        trends: upstreams.trends,
    };

    let registry = Arc::new(default_registry(&sources, cfg));
    let dashboard = Arc::new(Dashboard::new(Arc::new(DashboardCache::new(clock)), registry));

    AppState {
        refresher: Refresher::new(Arc::clone(&dashboard)),
        dashboard,
        source_cache,
        renderer: Arc::new(HtmlRenderer::new("Trend Radar")),
    }
}

/// Full router: dashboard/API routes plus `/metrics`.
pub fn app(cfg: &AppConfig, state: AppState) -> Router {
    let metrics = crate::metrics::Metrics::global(cfg.refresh_interval_secs);
    router(state).merge(metrics.router())
}
