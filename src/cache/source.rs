//! Time-windowed cache for upstream batches.
//!
//! One slot per source key. A fresh, non-empty batch is served without calling
//! upstream; otherwise the fetch runs (bounded by `fetch_timeout`) and a failure
//! falls back to the previous batch. No lock is held across the fetch, so two
//! concurrent callers may both fetch after expiry; the last writer wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use metrics::counter;

use crate::clock::{elapsed_secs, SharedClock};

#[derive(Debug)]
struct Slot<T> {
    batch: Arc<Vec<T>>,
    fetched_at: DateTime<Utc>,
}

pub struct SourceCache<T> {
    clock: SharedClock,
    fetch_timeout: Duration,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> SourceCache<T> {
    pub fn new(clock: SharedClock, fetch_timeout: Duration) -> Self {
        Self {
            clock,
            fetch_timeout,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Fresh batch for `key`, if one is cached and younger than `ttl`.
    fn fresh(&self, key: &str, ttl: Duration) -> Option<Arc<Vec<T>>> {
        let now = self.clock.now();
        let g = self.lock();
        g.get(key).and_then(|slot| {
            let fresh = !slot.batch.is_empty()
                && elapsed_secs(slot.fetched_at, now) < ttl.as_secs_f64();
            fresh.then(|| Arc::clone(&slot.batch))
        })
    }

    fn previous(&self, key: &str) -> Option<Arc<Vec<T>>> {
        self.lock().get(key).map(|s| Arc::clone(&s.batch))
    }

    /// Cached batch for `key` if fresh, else the result of `fetch`.
    ///
    /// Never fails: on fetch error or timeout the previous batch (possibly
    /// stale) is returned, or an empty batch when nothing was ever cached.
    pub async fn get_batch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Arc<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<T>>>,
    {
        if let Some(batch) = self.fresh(key, ttl) {
            tracing::debug!(target: "cache", source = key, items = batch.len(), "source cache hit");
            counter!("source_cache_hits_total", "source" => key.to_string()).increment(1);
            return batch;
        }

        let res = match tokio::time::timeout(self.fetch_timeout, fetch()).await {
            Ok(r) => r,
            Err(_) => Err(anyhow!(
                "fetch timed out after {}s",
                self.fetch_timeout.as_secs_f64()
            )),
        };

        match res {
            Ok(items) => {
                let batch = Arc::new(items);
                let fetched_at = self.clock.now();
                self.lock().insert(
                    key.to_string(),
                    Slot {
                        batch: Arc::clone(&batch),
                        fetched_at,
                    },
                );
                tracing::info!(target: "cache", source = key, items = batch.len(), "source batch refreshed");
                batch
            }
            Err(e) => {
                counter!("source_cache_fetch_errors_total", "source" => key.to_string())
                    .increment(1);
                match self.previous(key) {
                    Some(prev) => {
                        tracing::warn!(target: "cache", source = key, error = ?e, items = prev.len(), "fetch failed; serving previous batch");
                        prev
                    }
                    None => {
                        tracing::warn!(target: "cache", source = key, error = ?e, "fetch failed; no previous batch");
                        Arc::new(Vec::new())
                    }
                }
            }
        }
    }

    /// Drop every cached batch.
    pub fn invalidate_all(&self) {
        self.lock().clear();
    }
}
