//! Cache service configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::key::CACHE_PREFIX;
use super::traits::ServiceCacheError;

/// Default fast tier capacity in entries.
pub const DEFAULT_FAST_CAPACITY: usize = 100;

/// Default interval between background sweeps of expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Which durable store backs the persistent tier.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreConfig {
    /// Process-local store. Nothing survives a restart.
    Memory {
        /// Optional byte limit for keys and values.
        quota_bytes: Option<u64>,
    },

    /// One file per key in `directory`.
    File {
        directory: PathBuf,
        /// Optional byte limit for keys and values.
        quota_bytes: Option<u64>,
    },
}

/// Configuration for [`CacheService`](super::CacheService).
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceCacheConfig {
    /// Maximum number of entries held by the fast tier.
    pub fast_capacity: usize,

    /// Prefix for persistent storage keys. Empty means "recognized
    /// namespaces only" (`weather:`, `geocode:`, `cache:`).
    pub prefix: String,

    /// Interval between background sweeps.
    pub sweep_interval: Duration,

    /// Durable store backing the persistent tier.
    pub store: StoreConfig,
}

impl ServiceCacheConfig {
    /// Configuration backed by an in-memory store.
    pub fn memory() -> Self {
        Self {
            fast_capacity: DEFAULT_FAST_CAPACITY,
            prefix: CACHE_PREFIX.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            store: StoreConfig::Memory { quota_bytes: None },
        }
    }

    /// Configuration backed by files in `directory`.
    pub fn file(directory: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig::File {
                directory: directory.into(),
                quota_bytes: None,
            },
            ..Self::memory()
        }
    }

    /// Set the fast tier capacity.
    pub fn with_fast_capacity(mut self, entries: usize) -> Self {
        self.fast_capacity = entries;
        self
    }

    /// Set the persistent key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the background sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Limit the durable store to `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        match &mut self.store {
            StoreConfig::Memory { quota_bytes: q } | StoreConfig::File { quota_bytes: q, .. } => {
                *q = Some(quota_bytes)
            }
        }
        self
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ServiceCacheError> {
        if self.fast_capacity == 0 {
            return Err(ServiceCacheError::InvalidConfig(
                "fast tier capacity must be at least 1".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(ServiceCacheError::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceCacheConfig {
    fn default() -> Self {
        Self::memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceCacheConfig::default();
        assert_eq!(config.fast_capacity, 100);
        assert_eq!(config.prefix, "cache:");
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.store, StoreConfig::Memory { quota_bytes: None });
    }

    #[test]
    fn test_builders() {
        let config = ServiceCacheConfig::file("/tmp/tripcast")
            .with_fast_capacity(8)
            .with_prefix("")
            .with_sweep_interval(Duration::from_secs(1))
            .with_quota(4096);

        assert_eq!(config.fast_capacity, 8);
        assert!(config.prefix.is_empty());
        assert_eq!(
            config.store,
            StoreConfig::File {
                directory: PathBuf::from("/tmp/tripcast"),
                quota_bytes: Some(4096),
            }
        );
    }

    #[test]
    fn test_validate() {
        assert!(ServiceCacheConfig::memory().validate().is_ok());
        assert!(ServiceCacheConfig::memory()
            .with_fast_capacity(0)
            .validate()
            .is_err());
        assert!(ServiceCacheConfig::memory()
            .with_sweep_interval(Duration::ZERO)
            .validate()
            .is_err());
    }
}
