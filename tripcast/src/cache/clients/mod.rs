//! Typed cache clients for the lookup services.
//!
//! These clients wrap a [`JsonCache`] with key translation, fixed TTLs and
//! (de)serialization of the lookup result types.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │  GeocodeCacheClient  │     │  WeatherCacheClient  │
//! │                      │     │                      │
//! │ address → key        │     │ WeatherQuery → key   │
//! │ TTL 365 days         │     │ TTL 2 hours          │
//! └──────────┬───────────┘     └──────────┬───────────┘
//!            │                            │
//!            ▼                            ▼
//! ┌─────────────────────────────────────────────────┐
//! │              Arc<JsonCache>                     │
//! │                                                 │
//! │  Two-tier cache of serde_json::Value            │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! let geocode = GeocodeCacheClient::new(service.cache());
//!
//! let result = geocode
//!     .get_or_fetch("Beijing", || async { provider.geocode("Beijing").await })
//!     .await?;
//! ```

mod geocode;
mod weather;

pub use geocode::{GeocodeCacheClient, GEOCODE_TTL};
pub use weather::{WeatherCacheClient, WEATHER_TTL};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::coordinator::JsonCache;

/// Read `key` and decode it as `T`.
///
/// A value of the wrong shape is deleted and treated as a miss so the
/// caller refetches it.
fn read_typed<T: DeserializeOwned>(cache: &JsonCache, key: &str) -> Option<T> {
    let value = cache.get(key)?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(e) => {
            warn!(error = %e, key = %key, "Discarding cached value with unexpected shape");
            cache.delete(key);
            None
        }
    }
}

/// Encode `value` and store it under `key`.
fn write_typed<T: Serialize>(cache: &JsonCache, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(json) => cache.set(key, json, ttl),
        Err(e) => warn!(error = %e, key = %key, "Cannot encode value for cache"),
    }
}
