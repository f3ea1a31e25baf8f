//! Background refresher: periodic sweeps over every registered view.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::views::Dashboard;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub refreshed: Vec<String>,
    /// Views whose producer returned an error or panicked.
    pub failed: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct Refresher {
    dashboard: Arc<Dashboard>,
}

impl Refresher {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        Self { dashboard }
    }

    /// Recompute every view in order. Each producer runs in its own task so an
    /// error or panic is contained to that view.
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let t0 = std::time::Instant::now();

        for view in self.dashboard.registry().iter() {
            let cache = Arc::clone(self.dashboard.cache());
            let v = view.clone();
            let task = tokio::spawn(async move {
                let produce = Arc::clone(&v.producer);
                cache.refresh(&v.name, v.ttl, move || produce()).await
            });

            match task.await {
                Ok(Ok(())) => report.refreshed.push(view.name.clone()),
                Ok(Err(e)) => {
                    tracing::warn!(target: "refresh", view = %view.name, error = ?e, "producer failed");
                    counter!("refresh_producer_errors_total", "view" => view.name.clone()).increment(1);
                    report.failed.push(view.name.clone());
                }
                Err(join) => {
                    tracing::error!(target: "refresh", view = %view.name, error = %join, "producer panicked");
                    counter!("refresh_producer_errors_total", "view" => view.name.clone()).increment(1);
                    report.failed.push(view.name.clone());
                }
            }
        }

        counter!("refresh_sweeps_total").increment(1);
        tracing::info!(
            target: "refresh",
            refreshed = report.refreshed.len(),
            failed = report.failed.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "sweep finished"
        );
        report
    }

    /// Sweep, then sleep the full `interval`, forever.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            loop {
                this.sweep_once().await;
                tokio::time::sleep(interval).await;
            }
        })
    }

    /// One extra sweep in the background; does not wait for it.
    pub fn spawn_one_shot(&self) -> JoinHandle<SweepReport> {
        let this = self.clone();
        tokio::spawn(async move { this.sweep_once().await })
    }
}
