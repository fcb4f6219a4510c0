//! Geocode cache client.
//!
//! Key format: `geocode:{address}` with surrounding whitespace trimmed.
//! Addresses rarely move, so entries live for a year.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{read_typed, write_typed};
use crate::cache::coordinator::JsonCache;
use crate::cache::key::geocode_key;
use crate::lookup::GeocodeResult;

/// Lifetime of a cached geocode.
pub const GEOCODE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache client for address geocoding results.
#[derive(Clone)]
pub struct GeocodeCacheClient {
    cache: Arc<JsonCache>,
}

impl GeocodeCacheClient {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    /// Get the cached coordinates for `address`.
    pub fn get(&self, address: &str) -> Option<GeocodeResult> {
        read_typed(&self.cache, &geocode_key(address))
    }

    /// Cache the coordinates for `address`.
    pub fn set(&self, address: &str, result: &GeocodeResult) {
        write_typed(&self.cache, &geocode_key(address), result, GEOCODE_TTL);
    }

    /// Forget the cached coordinates for `address`.
    pub fn delete(&self, address: &str) -> bool {
        self.cache.delete(&geocode_key(address))
    }

    /// Return the cached result, or run `fetch` and cache what it returns.
    ///
    /// Errors from `fetch` are passed through and nothing is cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        address: &str,
        fetch: F,
    ) -> Result<GeocodeResult, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GeocodeResult, E>>,
    {
        if let Some(cached) = self.get(address) {
            return Ok(cached);
        }

        debug!(address, "Geocode cache miss, fetching");
        let result = fetch().await?;
        self.set(address, &result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::{Clock, ManualClock};
    use crate::cache::store::MemoryStore;
    use crate::cache::traits::KvStore;

    fn client() -> (GeocodeCacheClient, Arc<JsonCache>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(JsonCache::new(
            10,
            "cache:",
            Arc::new(MemoryStore::new()) as Arc<dyn KvStore>,
            clock.clone() as Arc<dyn Clock>,
        ));
        (GeocodeCacheClient::new(Arc::clone(&cache)), cache, clock)
    }

    fn beijing() -> GeocodeResult {
        GeocodeResult {
            latitude: 39.9,
            longitude: 116.4,
            formatted_address: "Beijing".to_string(),
        }
    }

    #[test]
    fn test_set_and_get() {
        let (client, cache, _clock) = client();
        client.set("Beijing", &beijing());

        assert_eq!(client.get("Beijing"), Some(beijing()));
        assert_eq!(client.get(" Beijing "), Some(beijing()));
        assert!(cache.has("geocode:Beijing"));
    }

    #[test]
    fn test_entries_live_for_a_year() {
        let (client, _cache, clock) = client();
        client.set("Beijing", &beijing());

        clock.advance(GEOCODE_TTL);
        assert!(client.get("Beijing").is_some());

        clock.advance(Duration::from_millis(1));
        assert!(client.get("Beijing").is_none());
    }

    #[test]
    fn test_wrong_shape_is_discarded() {
        let (client, cache, _clock) = client();
        cache.set(
            "geocode:Beijing",
            serde_json::json!({"lat": 39.9}),
            GEOCODE_TTL,
        );

        assert_eq!(client.get("Beijing"), None);
        assert!(!cache.has("geocode:Beijing"));
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once() {
        let (client, _cache, _clock) = client();
        let mut calls = 0;

        let first: Result<_, String> = client
            .get_or_fetch("Beijing", || {
                calls += 1;
                async { Ok(beijing()) }
            })
            .await;
        assert_eq!(first.unwrap(), beijing());

        let second: Result<_, String> = client
            .get_or_fetch("Beijing", || {
                calls += 1;
                async { Ok(beijing()) }
            })
            .await;
        assert_eq!(second.unwrap(), beijing());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_error_not_cached() {
        let (client, cache, _clock) = client();

        let result = client
            .get_or_fetch("Atlantis", || async { Err::<GeocodeResult, _>("not found") })
            .await;
        assert_eq!(result.unwrap_err(), "not found");
        assert!(cache.keys().is_empty());
    }
}
