//! Weather cache client.
//!
//! Key format: `weather:{lat}:{lng}:{date}:{time}`. Forecasts change, so
//! entries live for two hours.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{read_typed, write_typed};
use crate::cache::coordinator::JsonCache;
use crate::cache::key::weather_key;
use crate::lookup::{WeatherInfo, WeatherQuery};

/// Lifetime of a cached forecast.
pub const WEATHER_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Cache client for weather forecasts.
#[derive(Clone)]
pub struct WeatherCacheClient {
    cache: Arc<JsonCache>,
}

impl WeatherCacheClient {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    /// Get the cached forecast for `query`.
    pub fn get(&self, query: &WeatherQuery) -> Option<WeatherInfo> {
        read_typed(&self.cache, &Self::query_to_key(query))
    }

    /// Cache the forecast for `query`.
    pub fn set(&self, query: &WeatherQuery, info: &WeatherInfo) {
        write_typed(&self.cache, &Self::query_to_key(query), info, WEATHER_TTL);
    }

    /// Forget the cached forecast for `query`.
    pub fn delete(&self, query: &WeatherQuery) -> bool {
        self.cache.delete(&Self::query_to_key(query))
    }

    /// Return the cached forecast, or run `fetch` and cache what it returns.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        query: &WeatherQuery,
        fetch: F,
    ) -> Result<WeatherInfo, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WeatherInfo, E>>,
    {
        if let Some(cached) = self.get(query) {
            return Ok(cached);
        }

        debug!(date = %query.date, time = %query.time, "Weather cache miss, fetching");
        let info = fetch().await?;
        self.set(query, &info);
        Ok(info)
    }

    fn query_to_key(query: &WeatherQuery) -> String {
        weather_key(query.latitude, query.longitude, &query.date, &query.time)
    }
}
