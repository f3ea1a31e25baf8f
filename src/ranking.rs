//! Ranking pipeline: batch -> context -> scores -> sorted top-N -> display records.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::analyze::context::{build_context, KeywordPolicy};
use crate::analyze::scoring::{score, RecencyScale, ScoreParams, ScoredItem, SortMethod};
use crate::cache::SourceCache;
use crate::clock::SharedClock;
use crate::format::{format_scored, DisplayItem};
use crate::ingest::types::{ContentItem, ItemSource};

/// Per-domain knobs: cache key, keyword policy, recency curve and batch TTL.
#[derive(Debug, Clone, Copy)]
pub struct RankDomain {
    pub key: &'static str,
    pub policy: KeywordPolicy,
    pub scale: RecencyScale,
    pub source_ttl: Duration,
}

impl RankDomain {
    pub fn papers(source_ttl: Duration) -> Self {
        Self {
            key: "papers",
            policy: KeywordPolicy::PAPERS,
            scale: RecencyScale::Days,
            source_ttl,
        }
    }

    pub fn stories(source_ttl: Duration) -> Self {
        Self {
            key: "stories",
            policy: KeywordPolicy::STORIES,
            scale: RecencyScale::Hours,
            source_ttl,
        }
    }
}

/// Score, stable-sort (descending) and truncate one batch.
///
/// Malformed items are skipped. Equal scores keep batch order.
pub fn rank_batch(
    items: &[ContentItem],
    method: SortMethod,
    max_results: usize,
    domain: &RankDomain,
    now: DateTime<Utc>,
) -> Vec<ScoredItem> {
    let (good, bad): (Vec<&ContentItem>, Vec<&ContentItem>) =
        items.iter().partition(|it| it.is_well_formed());
    if !bad.is_empty() {
        tracing::warn!(target: "ranking", domain = domain.key, skipped = bad.len(), "skipping malformed items");
        counter!("ranking_skipped_items_total", "domain" => domain.key).increment(bad.len() as u64);
    }

    let owned: Vec<ContentItem> = good.into_iter().cloned().collect();
    let context = build_context(&owned, &domain.policy);
    let params = ScoreParams {
        context: &context,
        policy: &domain.policy,
        scale: domain.scale,
        now,
    };

    let mut scored: Vec<ScoredItem> = owned
        .into_iter()
        .map(|item| {
            let s = score(&item, method, &params);
            ScoredItem {
                item,
                score: s,
                method,
            }
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(max_results);
    scored
}

pub struct RankingPipeline {
    domain: RankDomain,
    source: Arc<dyn ItemSource>,
    cache: Arc<SourceCache<ContentItem>>,
    clock: SharedClock,
}

impl RankingPipeline {
    pub fn new(
        domain: RankDomain,
        source: Arc<dyn ItemSource>,
        cache: Arc<SourceCache<ContentItem>>,
        clock: SharedClock,
    ) -> Self {
        Self {
            domain,
            source,
            cache,
            clock,
        }
    }

    /// Current batch through the source cache.
    pub async fn batch(&self) -> Arc<Vec<ContentItem>> {
        let source = Arc::clone(&self.source);
        self.cache
            .get_batch(self.domain.key, self.domain.source_ttl, move || async move {
                source.fetch_batch().await
            })
            .await
    }

    pub async fn try_rank(
        &self,
        method: SortMethod,
        max_results: usize,
    ) -> anyhow::Result<Vec<ScoredItem>> {
        let batch = self.batch().await;
        if batch.is_empty() {
            tracing::info!(target: "ranking", domain = self.domain.key, %method, "empty batch");
            return Ok(Vec::new());
        }
        let now = self.clock.now();
        let ranked = rank_batch(&batch, method, max_results, &self.domain, now);
        tracing::debug!(
            target: "ranking",
            domain = self.domain.key,
            source = self.source.name(),
            %method,
            batch = batch.len(),
            returned = ranked.len(),
            "ranked batch"
        );
        Ok(ranked)
    }

    /// Ranked and formatted top-N. Never fails; errors yield an empty list.
    pub async fn rank(&self, method: SortMethod, max_results: usize) -> Vec<DisplayItem> {
        match self.try_rank(method, max_results).await {
            Ok(items) => {
                let now = self.clock.now();
                items.iter().map(|s| format_scored(s, now)).collect()
            }
            Err(e) => {
                tracing::error!(target: "ranking", domain = self.domain.key, %method, error = ?e, "ranking failed");
                Vec::new()
            }
        }
    }
}
