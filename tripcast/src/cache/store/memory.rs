//! In-process [`KvStore`] with an optional byte quota.
//!
//! Nothing is durable here. The store stands in for browser local storage
//! when a real directory is not wanted, and its quota makes the
//! "store is full" recovery path testable.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::entry_size;
use crate::cache::traits::{KvStore, StoreError};

/// A [`KvStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `quota_bytes`.
    ///
    /// Keys and values both count towards the quota.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota_bytes {
            let used: u64 = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map(|old| entry_size(key, old)).unwrap_or(0);
            let needed = used - replaced + entry_size(key, value);
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn usage_bytes(&self) -> u64 {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();

        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_keys_are_sorted() {
        let store = MemoryStore::new();
        store.set("b", "").unwrap();
        store.set("a", "").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_quota_rejects_overflow() {
        let store = MemoryStore::with_quota(10);
        store.set("k1", "1234").unwrap(); // 6 bytes

        let err = store.set("k2", "12345").unwrap_err(); // 6 + 7 = 13
        assert!(err.is_quota_exceeded());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_quota_counts_replacement_once() {
        let store = MemoryStore::with_quota(10);
        store.set("k1", "12345678").unwrap(); // 10 bytes
        // Replacing the same key frees the old value first
        store.set("k1", "87654321").unwrap();
        assert_eq!(store.usage_bytes(), 10);
    }
}
