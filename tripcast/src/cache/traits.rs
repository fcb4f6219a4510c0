//! The durable key-value store interface and cache error types.
//!
//! The persistent tier sits on top of a [`KvStore`]: a flat map of string
//! keys to string values, like browser local storage. Stores are shared
//! through `Arc<dyn KvStore>`, so the trait stays dyn-compatible.
//!
//! Store errors never escape the cache. The persistent tier logs them and
//! degrades to a miss or a dropped write.

use std::io;

use thiserror::Error;

/// Errors reported by a durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would exceed the store's capacity.
    #[error("Store quota exceeded: {needed} bytes needed (quota: {quota})")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// The device or filesystem backing the store ran out of space.
    #[error("Storage full: {0}")]
    StorageFull(#[source] io::Error),

    /// I/O error in a disk-backed store.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
}

impl StoreError {
    /// Whether this error means the store is full, either by its own quota
    /// or because the underlying storage has no room left.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            StoreError::QuotaExceeded { .. } | StoreError::StorageFull(_)
        )
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => {
                StoreError::StorageFull(err)
            }
            _ => StoreError::Io(err),
        }
    }
}

/// Errors that can occur while setting up the cache service.
#[derive(Debug, Error)]
pub enum ServiceCacheError {
    /// The durable store could not be opened.
    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    /// The configuration is unusable.
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// A flat, durable string-to-string store.
///
/// Implementations must make each `set` atomic per key: a concurrent `get`
/// sees either the old or the new value, never a partial write.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error for which [`StoreError::is_quota_exceeded`] holds if
    /// the store is full.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Returns `true` if it existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Every key in the store, including data that is not cache entries.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Bytes currently charged against the store's quota.
    fn usage_bytes(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::QuotaExceeded {
            needed: 120,
            quota: 100,
        };
        let message = err.to_string();
        assert!(message.contains("120"));
        assert!(message.contains("100"));
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn test_store_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!err.is_quota_exceeded());
    }

    #[test]
    fn test_full_disk_counts_as_quota_exceeded() {
        for kind in [io::ErrorKind::StorageFull, io::ErrorKind::QuotaExceeded] {
            let err: StoreError = io::Error::new(kind, "no space left on device").into();
            assert!(matches!(err, StoreError::StorageFull(_)));
            assert!(err.is_quota_exceeded());
        }
    }

    #[test]
    fn test_service_error_wraps_store_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: ServiceCacheError = StoreError::from(io_err).into();
        assert!(err.to_string().starts_with("Failed to open store"));
    }
}
