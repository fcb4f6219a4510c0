//! Cache service lifecycle.
//!
//! [`CacheService`] owns everything behind the cache: the durable store,
//! the [`TieredCache`] and its background [`SweepDaemon`]. Starting the
//! service starts the daemon; shutting it down stops the daemon. Consumers
//! only ever receive the `Arc<TieredCache>`.
//!
//! ```ignore
//! use tripcast::cache::{CacheService, ServiceCacheConfig};
//!
//! let service = CacheService::start(ServiceCacheConfig::file("/var/cache/tripcast")).await?;
//! let cache = service.cache();
//! cache.set("geocode:Beijing", json, ttl);
//!
//! service.shutdown().await;
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::clock::{Clock, SystemClock};
use super::config::{ServiceCacheConfig, StoreConfig};
use super::coordinator::TieredCache;
use super::store::{FileStore, MemoryStore};
use super::sweep::SweepDaemon;
use super::traits::{KvStore, ServiceCacheError};

/// A running cache with its sweep daemon.
///
/// Dropping the service cancels the daemon without waiting for it. Call
/// [`shutdown`](Self::shutdown) to wait for a clean stop.
pub struct CacheService<V = serde_json::Value> {
    cache: Arc<TieredCache<V>>,
    shutdown: CancellationToken,
    daemon: Option<JoinHandle<()>>,
}

impl<V> CacheService<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Open the configured store and start the cache.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceCacheError`] if the configuration is invalid or the
    /// store cannot be opened.
    pub async fn start(config: ServiceCacheConfig) -> Result<Self, ServiceCacheError> {
        config.validate()?;
        let store = open_store(&config.store)?;
        Self::start_with(config, store, Arc::new(SystemClock))
    }

    /// Start the cache over an already opened store and clock.
    pub fn start_with(
        config: ServiceCacheConfig,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ServiceCacheError> {
        config.validate()?;

        let cache = Arc::new(TieredCache::new(
            config.fast_capacity,
            config.prefix.clone(),
            store,
            clock,
        ));

        let shutdown = CancellationToken::new();
        let daemon = SweepDaemon::new(Arc::clone(&cache), config.sweep_interval);
        let handle = tokio::spawn(daemon.run(shutdown.clone()));

        info!(
            fast_capacity = config.fast_capacity,
            prefix = %config.prefix,
            "Cache service started"
        );

        Ok(Self {
            cache,
            shutdown,
            daemon: Some(handle),
        })
    }

    /// The shared cache handle.
    pub fn cache(&self) -> Arc<TieredCache<V>> {
        Arc::clone(&self.cache)
    }

    /// Whether the sweep daemon is still running.
    pub fn is_running(&self) -> bool {
        self.daemon.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the sweep daemon and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.daemon.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache sweep daemon did not stop cleanly");
            }
        }
        info!("Cache service stopped");
    }
}

impl<V> Drop for CacheService<V> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Open the durable store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>, ServiceCacheError> {
    let store: Arc<dyn KvStore> = match config {
        StoreConfig::Memory { quota_bytes: None } => Arc::new(MemoryStore::new()),
        StoreConfig::Memory {
            quota_bytes: Some(quota),
        } => Arc::new(MemoryStore::with_quota(*quota)),
        StoreConfig::File {
            directory,
            quota_bytes,
        } => {
            let store = FileStore::open(directory)?;
            match quota_bytes {
                Some(quota) => Arc::new(store.with_quota(*quota)),
                None => Arc::new(store),
            }
        }
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let service: CacheService = CacheService::start(ServiceCacheConfig::memory())
            .await
            .unwrap();
        assert!(service.is_running());

        let cache = service.cache();
        cache.set("geocode:Beijing", serde_json::json!({"lat": 39.9}), Duration::from_secs(60));
        assert_eq!(
            cache.get("geocode:Beijing"),
            Some(serde_json::json!({"lat": 39.9}))
        );

        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result: Result<CacheService, _> =
            CacheService::start(ServiceCacheConfig::memory().with_fast_capacity(0)).await;
        assert!(matches!(result, Err(ServiceCacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_file_store_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = ServiceCacheConfig::file(dir.path());

        let first: CacheService = CacheService::start(config.clone()).await.unwrap();
        first
            .cache()
            .set("weather:X", serde_json::json!("sunny"), Duration::from_secs(60));
        first.shutdown().await;

        let second: CacheService = CacheService::start(config).await.unwrap();
        let cache = second.cache();
        assert_eq!(cache.describe("weather:X").tier.as_str(), "persistent");
        assert_eq!(cache.get("weather:X"), Some(serde_json::json!("sunny")));
        assert_eq!(cache.describe("weather:X").tier.as_str(), "fast");
        second.shutdown().await;
    }

    #[test]
    fn test_open_store_with_quota() {
        let store = open_store(&StoreConfig::Memory {
            quota_bytes: Some(4),
        })
        .unwrap();
        assert!(store.set("key", "value").unwrap_err().is_quota_exceeded());
    }
}
