//! Tripcast - trip weather lookups backed by a two-tier cache
//!
//! A trip is a sequence of waypoints. Each waypoint is geocoded and then
//! matched against a weather forecast for its arrival date. Both lookups are
//! expensive network calls, so their results are kept in a two-tier cache:
//! a bounded in-memory LRU tier in front of a durable key-value store.
//!
//! The network clients themselves live outside this crate. They talk to the
//! cache through [`cache::GeocodeCacheClient`] and [`cache::WeatherCacheClient`],
//! or directly through [`cache::TieredCache`].

pub mod app;
pub mod cache;
pub mod config;
pub mod logging;
pub mod lookup;

/// Crate version, embedded in logs and CLI output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
