//! Named view cache (cache-aside) in front of the dashboard producers.
//!
//! Each entry carries its own TTL. An expired entry is recomputed; if the
//! producer fails, the stale value is served but left untouched so the next
//! call retries.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::clock::{elapsed_secs, SharedClock};

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        elapsed_secs(self.inserted_at, now) < self.ttl.as_secs_f64()
    }
}

/// Outcome of a lookup, useful for diagnostics headers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
    /// Producer failed; a stale value was served.
    Stale,
}

pub struct DashboardCache<V> {
    clock: SharedClock,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> DashboardCache<V> {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Fresh value for `name`, without computing anything.
    pub fn get(&self, name: &str) -> Option<V> {
        let now = self.clock.now();
        self.read()
            .get(name)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    /// True when `name` holds a value that has not expired.
    pub fn has(&self, name: &str) -> bool {
        let now = self.clock.now();
        self.read().get(name).is_some_and(|e| e.is_fresh(now))
    }

    pub fn insert(&self, name: &str, ttl: Duration, value: V) {
        let inserted_at = self.clock.now();
        self.write().insert(
            name.to_string(),
            Entry {
                value,
                inserted_at,
                ttl,
            },
        );
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Presence map for the given names.
    pub fn status<'a, I>(&self, names: I) -> BTreeMap<String, bool>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|n| (n.to_string(), self.has(n)))
            .collect()
    }

    fn stale(&self, name: &str) -> Option<V> {
        self.read().get(name).map(|e| e.value.clone())
    }

    /// Serve from cache, or run `producer` on miss/expiry.
    pub async fn get_or_compute<F, Fut>(
        &self,
        name: &str,
        ttl: Duration,
        producer: F,
    ) -> anyhow::Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        self.get_or_compute_traced(name, ttl, producer)
            .await
            .map(|(v, _)| v)
    }

    /// Same as [`get_or_compute`](Self::get_or_compute), also reporting how the value was obtained.
    pub async fn get_or_compute_traced<F, Fut>(
        &self,
        name: &str,
        ttl: Duration,
        producer: F,
    ) -> anyhow::Result<(V, Lookup)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        if let Some(v) = self.get(name) {
            counter!("dashboard_cache_hits_total", "view" => name.to_string()).increment(1);
            return Ok((v, Lookup::Hit));
        }
        counter!("dashboard_cache_misses_total", "view" => name.to_string()).increment(1);
        tracing::info!(target: "cache", view = name, "computing view");

        match producer().await {
            Ok(v) => {
                self.insert(name, ttl, v.clone());
                Ok((v, Lookup::Miss))
            }
            Err(e) => match self.stale(name) {
                Some(v) => {
                    tracing::warn!(target: "cache", view = name, error = ?e, "producer failed; serving stale view");
                    Ok((v, Lookup::Stale))
                }
                None => Err(e.context(format!("computing view {name}"))),
            },
        }
    }

    /// Recompute unconditionally; on failure the current entry is kept.
    pub async fn refresh<F, Fut>(&self, name: &str, ttl: Duration, producer: F) -> anyhow::Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>>,
    {
        let v = producer().await?;
        self.insert(name, ttl, v);
        Ok(())
    }
}
