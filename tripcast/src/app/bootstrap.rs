//! Application bootstrap implementation.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::cache::{
    CacheService, CacheStats, GeocodeCacheClient, JsonCache, StoreConfig, WeatherCacheClient,
};
use crate::config::ConfigFile;

/// Tripcast application with managed cache lifecycle.
///
/// The cache service starts first so its sweep daemon is running before any
/// client can write to the cache.
pub struct TripcastApp {
    cache_service: CacheService,
    geocode: GeocodeCacheClient,
    weather: WeatherCacheClient,
}

impl TripcastApp {
    /// Start the application with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the durable store
    /// cannot be opened.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        info!(version = crate::VERSION, "Starting tripcast");

        let store_kind = match &config.cache.store {
            StoreConfig::Memory { .. } => "memory",
            StoreConfig::File { .. } => "file",
        };
        let cache_service = CacheService::start(config.cache.clone())
            .await
            .map_err(AppError::CacheStart)?;

        info!(
            fast_capacity = config.cache.fast_capacity,
            prefix = %config.cache.prefix,
            store = store_kind,
            sweep_interval_secs = config.cache.sweep_interval.as_secs(),
            "Cache service started"
        );

        let cache = cache_service.cache();
        Ok(Self {
            geocode: GeocodeCacheClient::new(Arc::clone(&cache)),
            weather: WeatherCacheClient::new(cache),
            cache_service,
        })
    }

    /// Load the user's configuration file and start from it.
    pub async fn from_config_file() -> Result<Self, AppError> {
        let file = ConfigFile::load()?;
        Self::start(AppConfig::from_config_file(&file)).await
    }

    /// The shared two-tier cache.
    pub fn cache(&self) -> Arc<JsonCache> {
        self.cache_service.cache()
    }

    pub fn geocode(&self) -> &GeocodeCacheClient {
        &self.geocode
    }

    pub fn weather(&self) -> &WeatherCacheClient {
        &self.weather
    }

    pub fn stats(&self) -> CacheStats {
        self.cache_service.cache().stats()
    }

    /// Stop the sweep daemon and release the cache.
    pub async fn shutdown(self) {
        info!("Shutting down tripcast");
        self.cache_service.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ServiceCacheConfig;
    use crate::lookup::{GeocodeResult, WeatherQuery};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let app = TripcastApp::start(AppConfig::new(ServiceCacheConfig::memory()))
            .await
            .unwrap();

        assert_eq!(app.cache().fast_capacity(), 100);
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = AppConfig::new(ServiceCacheConfig::memory().with_fast_capacity(0));
        let result = TripcastApp::start(config).await;
        assert!(matches!(result, Err(AppError::CacheStart(_))));
    }

    #[tokio::test]
    async fn test_clients_share_one_cache() {
        let temp = TempDir::new().unwrap();
        let app = TripcastApp::start(AppConfig::new(ServiceCacheConfig::file(temp.path())))
            .await
            .unwrap();

        let beijing = GeocodeResult {
            latitude: 39.9,
            longitude: 116.4,
            formatted_address: "Beijing".to_string(),
        };
        app.geocode().set("Beijing", &beijing);
        let query = WeatherQuery::at(&beijing, "2025-06-01", "09:00");
        assert!(app.weather().get(&query).is_none());

        assert_eq!(
            app.cache().keys(),
            vec!["geocode:Beijing".to_string()]
        );
        assert_eq!(app.stats().total.misses, 1);
        app.shutdown().await;
    }
}
