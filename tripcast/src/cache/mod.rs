//! Two-tier cache for lookup results.
//!
//! A small in-memory tier in front of a durable key-value tier, with
//! per-entry expiry on both and LRU eviction on the memory side.
//!
//! - [`TieredCache`] - The coordinator; the only interface consumers use
//! - [`CacheService`] - Lifecycle wrapper that owns the sweep daemon
//! - [`KvStore`] trait - Durable string store behind the persistent tier
//! - [`MemoryStore`] / [`FileStore`] - Store implementations
//! - [`GeocodeCacheClient`] / [`WeatherCacheClient`] - Typed clients
//!
//! ```ignore
//! use tripcast::cache::{CacheService, ServiceCacheConfig};
//!
//! let service = CacheService::start(ServiceCacheConfig::file("/tmp/tripcast")).await?;
//!
//! let cache = service.cache();
//! cache.set("geocode:Beijing", json!({"latitude": 39.9}), Duration::from_secs(60));
//!
//! service.shutdown().await;
//! ```

mod clock;
mod config;
mod coordinator;
mod key;
mod record;
mod service;
mod stats;
mod sweep;
mod traits;

pub mod clients;
pub mod store;
pub mod tiers;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ServiceCacheConfig, StoreConfig, DEFAULT_FAST_CAPACITY, DEFAULT_SWEEP_INTERVAL};
pub use coordinator::{EntryInfo, InventoryItem, JsonCache, Tier, TieredCache};
pub use key::{
    geocode_key, is_recognized, weather_key, KeyKind, UnknownKeyKind, APP_PREFIX, CACHE_PREFIX,
    GEOCODE_PREFIX, WEATHER_PREFIX,
};
pub use record::{CacheRecord, RecordMetadata};
pub use service::{open_store, CacheService};
pub use stats::{CacheStats, TierStats, TotalStats};
pub use sweep::SweepDaemon;
pub use traits::{KvStore, ServiceCacheError, StoreError};

pub use clients::{GeocodeCacheClient, WeatherCacheClient, GEOCODE_TTL, WEATHER_TTL};
pub use store::{FileStore, MemoryStore};
