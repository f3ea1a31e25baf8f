// tests/refresh.rs
//
// Background refresher over a hand-built registry:
// - a failing producer does not stop the rest of the sweep
// - sweeps force a recompute even when entries are fresh
// - the periodic loop sweeps, sleeps the full interval, sweeps again

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use serde_json::json;

use trend_radar::cache::DashboardCache;
use trend_radar::clock::ManualClock;
use trend_radar::refresh::Refresher;
use trend_radar::views::{producer, Dashboard, ViewRegistry};

fn dashboard(reg: ViewRegistry) -> Arc<Dashboard> {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    Arc::new(Dashboard::new(
        Arc::new(DashboardCache::new(clock)),
        Arc::new(reg),
    ))
}

#[tokio::test]
async fn second_of_five_failing_does_not_block_the_rest() {
    let ran: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let mut reg = ViewRegistry::new();
    for i in 1..=5 {
        let ran = Arc::clone(&ran);
        reg.register(
            format!("view{i}"),
            Duration::from_secs(600),
            producer(move || {
                let ran = Arc::clone(&ran);
                async move {
                    ran.lock().unwrap().push(i);
                    if i == 2 {
                        return Err(anyhow!("producer {i} failed"));
                    }
                    Ok(json!(i))
                }
            }),
        );
    }
    let d = dashboard(reg);
    let report = Refresher::new(Arc::clone(&d)).sweep_once().await;

    assert_eq!(*ran.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(report.failed, ["view2"]);
    assert_eq!(report.refreshed, ["view1", "view3", "view4", "view5"]);
    for name in ["view1", "view3", "view4", "view5"] {
        assert!(d.cache().has(name), "{name} should be cached");
    }
    assert!(!d.cache().has("view2"));
}

#[tokio::test]
async fn sweep_recomputes_fresh_entries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let mut reg = ViewRegistry::new();
    reg.register(
        "v",
        Duration::from_secs(3600),
        producer(move || {
            let c = Arc::clone(&c);
            async move { Ok(json!(c.fetch_add(1, Ordering::SeqCst))) }
        }),
    );
    let d = dashboard(reg);
    let r = Refresher::new(Arc::clone(&d));

    r.sweep_once().await;
    r.sweep_once().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(d.cache().get("v"), Some(json!(1)));
}

#[tokio::test(start_paused = true)]
async fn periodic_loop_waits_full_interval_between_sweeps() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let mut reg = ViewRegistry::new();
    reg.register(
        "v",
        Duration::from_secs(60),
        producer(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(json!(null))
            }
        }),
    );
    let r = Refresher::new(dashboard(reg));
    let handle = r.spawn_periodic(Duration::from_secs(3600));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(1800)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(1800)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    handle.abort();
}
