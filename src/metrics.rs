use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    /// Install the process-wide Prometheus recorder (first call only) and
    /// publish the refresh interval as a static gauge.
    pub fn global(refresh_interval_secs: u64) -> &'static Metrics {
        let m = GLOBAL.get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("prometheus: install recorder");
            describe_all();
            Self { handle }
        });
        gauge!("refresh_interval_secs").set(refresh_interval_secs as f64);
        m
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_all() {
    describe_counter!("source_cache_hits_total", "Batches served from the source cache.");
    describe_counter!(
        "source_cache_fetch_errors_total",
        "Upstream fetches that failed or timed out."
    );
    describe_counter!("dashboard_cache_hits_total", "View lookups served from cache.");
    describe_counter!("dashboard_cache_misses_total", "View lookups that ran the producer.");
    describe_counter!("refresh_sweeps_total", "Completed background sweeps.");
    describe_counter!(
        "refresh_producer_errors_total",
        "Producers that failed or panicked during a sweep."
    );
    describe_counter!("ranking_skipped_items_total", "Malformed items dropped before scoring.");
    describe_gauge!("refresh_interval_secs", "Configured background refresh interval.");
    crate::ingest::ensure_metrics_described();
}
