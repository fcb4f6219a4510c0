//! Application bootstrap and lifecycle management.
//!
//! [`TripcastApp`] starts the cache service and hands out the typed lookup
//! clients, so callers never wire stores, tiers or the sweep daemon by hand.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 TripcastApp                   │
//! │                                               │
//! │  CacheService ──► Arc<JsonCache>              │
//! │   ├── KvStore (memory or file)                │
//! │   └── SweepDaemon (every sweep_interval)      │
//! │                                               │
//! │  GeocodeCacheClient / WeatherCacheClient      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tripcast::app::{AppConfig, TripcastApp};
//!
//! let app = TripcastApp::start(AppConfig::from_config_file(&config)).await?;
//! let coords = app.geocode().get("Beijing");
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::TripcastApp;
pub use config::AppConfig;
pub use error::AppError;
