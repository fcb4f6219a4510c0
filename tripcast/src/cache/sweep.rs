//! Background sweep of expired cache entries.
//!
//! The [`SweepDaemon`] wakes on a fixed interval and removes expired records
//! from both tiers. It runs until its cancellation token fires.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 SweepDaemon                   │
//! │                                               │
//! │  interval tick ──► spawn_blocking(sweep) ──┐  │
//! │        ▲                                   │  │
//! │        └───────────── log result ◄─────────┘  │
//! │                                               │
//! │  shutdown.cancelled() ──► exit                │
//! └──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::coordinator::TieredCache;

/// Periodic sweeper for a [`TieredCache`].
pub struct SweepDaemon<V> {
    cache: Arc<TieredCache<V>>,
    interval: Duration,
}

impl<V> SweepDaemon<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    /// Create a daemon sweeping `cache` every `interval`.
    pub fn new(cache: Arc<TieredCache<V>>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The first sweep happens one full interval after start.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Cache sweep daemon started");

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Cache sweep daemon stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    async fn sweep_once(&self) {
        let cache = Arc::clone(&self.cache);
        let start = Instant::now();

        // The persistent tier may touch the disk
        match tokio::task::spawn_blocking(move || cache.sweep_expired()).await {
            Ok(removed) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                if removed > 0 {
                    info!(removed, duration_ms, "Swept expired cache entries");
                } else {
                    debug!(duration_ms, "Cache sweep found nothing to remove");
                }
            }
            Err(e) => warn!(error = %e, "Cache sweep task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::{Clock, ManualClock};
    use crate::cache::store::MemoryStore;
    use crate::cache::traits::KvStore;

    fn cache_with_store() -> (Arc<TieredCache<String>>, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::new());
        let cache = TieredCache::new(
            10,
            "cache:",
            store.clone() as Arc<dyn KvStore>,
            clock.clone() as Arc<dyn Clock>,
        );
        (Arc::new(cache), clock, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_daemon_sweeps_on_interval() {
        let (cache, clock, store) = cache_with_store();
        cache.set("short", "s".to_string(), Duration::from_millis(10));
        cache.set("long", "l".to_string(), Duration::from_secs(3600));
        clock.advance(Duration::from_millis(20));

        let shutdown = CancellationToken::new();
        let daemon = SweepDaemon::new(Arc::clone(&cache), Duration::from_secs(60));
        let handle = tokio::spawn(daemon.run(shutdown.clone()));

        // Nothing is removed before the first interval elapses
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        for _ in 0..100 {
            if store.len() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.keys().unwrap(), vec!["cache:long"]);
        assert_eq!(cache.keys(), vec!["long"]);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_daemon_stops_on_cancel() {
        let (cache, _clock, _store) = cache_with_store();
        let shutdown = CancellationToken::new();
        let daemon = SweepDaemon::new(cache, Duration::from_secs(3600));
        let handle = tokio::spawn(daemon.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("daemon should stop promptly")
            .unwrap();
    }
}
