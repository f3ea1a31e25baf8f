//! Named dashboard views: registry of producers plus the cache in front of them.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::analyze::insights::story_insights;
use crate::analyze::scoring::SortMethod;
use crate::cache::DashboardCache;
use crate::config::AppConfig;
use crate::ingest::providers::google_trends::TrendsFeed;
use crate::ranking::RankingPipeline;

/// Zero-argument view builder. Cloned into every sweep and request.
pub type Producer = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

pub const HN_INSIGHTS: &str = "hn_insights";
pub const GOOGLE_TRENDS: &str = "google_trends";

/// Wrap an async closure as a [`Producer`].
pub fn producer<F, Fut>(f: F) -> Producer
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

#[derive(Clone)]
pub struct View {
    pub name: String,
    pub ttl: Duration,
    pub producer: Producer,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Ordered list of views; sweeps run them in registration order.
#[derive(Clone, Default, Debug)]
pub struct ViewRegistry {
    views: Vec<View>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view. A second registration under the same name replaces the first in place.
    pub fn register(&mut self, name: impl Into<String>, ttl: Duration, producer: Producer) -> &mut Self {
        let view = View {
            name: name.into(),
            ttl,
            producer,
        };
        match self.views.iter_mut().find(|v| v.name == view.name) {
            Some(slot) => *slot = view,
            None => self.views.push(view),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|v| v.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &View> {
        self.views.iter()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Upstream collaborators behind the default views.
#[derive(Clone)]
pub struct Sources {
    pub papers: Arc<RankingPipeline>,
    pub stories: Arc<RankingPipeline>,
    pub trends: Arc<dyn TrendsFeed>,
}

pub fn ranked_view_name(prefix: &str, method: SortMethod) -> String {
    format!("{prefix}_{method}")
}

fn ranked_producer(pipeline: Arc<RankingPipeline>, method: SortMethod, max_results: usize) -> Producer {
    producer(move || {
        let p = Arc::clone(&pipeline);
        async move {
            let items = p.rank(method, max_results).await;
            serde_json::to_value(items).context("serializing ranked view")
        }
    })
}

/// `arxiv_{hot,rising,new}`, `hn_{hot,rising,new}`, `hn_insights`, `google_trends`.
pub fn default_registry(sources: &Sources, cfg: &AppConfig) -> ViewRegistry {
    let mut reg = ViewRegistry::new();
    let max = cfg.max_results;

    for method in SortMethod::ALL {
        reg.register(
            ranked_view_name("arxiv", method),
            Duration::from_secs(cfg.views.papers_ttl_secs),
            ranked_producer(Arc::clone(&sources.papers), method, max),
        );
    }
    for method in SortMethod::ALL {
        reg.register(
            ranked_view_name("hn", method),
            Duration::from_secs(cfg.views.stories_ttl_secs),
            ranked_producer(Arc::clone(&sources.stories), method, max),
        );
    }

    let stories = Arc::clone(&sources.stories);
    reg.register(
        HN_INSIGHTS,
        Duration::from_secs(cfg.views.insights_ttl_secs),
        producer(move || {
            let p = Arc::clone(&stories);
            async move {
                let batch = p.batch().await;
                serde_json::to_value(story_insights(&batch)).context("serializing insights")
            }
        }),
    );

    let trends = Arc::clone(&sources.trends);
    reg.register(
        GOOGLE_TRENDS,
        Duration::from_secs(cfg.views.trends_ttl_secs),
        producer(move || {
            let t = Arc::clone(&trends);
            async move {
                let digest = t.fetch_digest().await?;
                serde_json::to_value(digest).context("serializing trends")
            }
        }),
    );

    reg
}

/// The view registry bound to its cache.
pub struct Dashboard {
    cache: Arc<DashboardCache<Value>>,
    registry: Arc<ViewRegistry>,
}

impl Dashboard {
    pub fn new(cache: Arc<DashboardCache<Value>>, registry: Arc<ViewRegistry>) -> Self {
        Self { cache, registry }
    }

    pub fn cache(&self) -> &Arc<DashboardCache<Value>> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<ViewRegistry> {
        &self.registry
    }

    /// Cached (or freshly computed) value of one view.
    pub async fn view(&self, name: &str) -> anyhow::Result<Value> {
        let view = self
            .registry
            .get(name)
            .ok_or_else(|| anyhow!("unknown view: {name}"))?;
        let produce = Arc::clone(&view.producer);
        self.cache
            .get_or_compute(&view.name, view.ttl, move || produce())
            .await
    }

    /// Like [`view`](Self::view) but degrades to `null`.
    pub async fn view_or_empty(&self, name: &str) -> Value {
        match self.view(name).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "cache", view = name, error = ?e, "view unavailable; rendering empty");
                Value::Null
            }
        }
    }

    /// Every registered view, in registration order, degraded per view.
    pub async fn snapshot(&self) -> Vec<(String, Value)> {
        let mut out = Vec::with_capacity(self.registry.len());
        for name in self.registry.names() {
            out.push((name.to_string(), self.view_or_empty(name).await));
        }
        out
    }

    pub fn status(&self) -> BTreeMap<String, bool> {
        self.cache.status(self.registry.names())
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
