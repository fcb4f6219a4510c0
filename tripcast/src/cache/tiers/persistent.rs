//! Durable tier layered on a [`KvStore`].
//!
//! Records are stored as JSON under `{prefix}{key}`. With an empty prefix
//! the tier owns only keys in the recognized namespaces
//! ([`RECOGNIZED_PREFIXES`](crate::cache::key::RECOGNIZED_PREFIXES)), so
//! unrelated data sharing the store is never listed, swept or cleared.
//!
//! # Failure policy
//!
//! Store errors stop here. A corrupt record reads as a miss and is
//! deleted. A write that fails because the store is full triggers one
//! sweep of expired records and a single retry. If that also fails, the
//! write is dropped and logged.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::key;
use crate::cache::record::{CacheRecord, RecordMetadata};
use crate::cache::stats::TierStats;
use crate::cache::traits::KvStore;

/// What a storage slot held when read without decoding the value.
enum Slot {
    Missing,
    Corrupt,
    Present(RecordMetadata),
}

/// The persistent tier.
pub struct PersistentTier<V> {
    store: Arc<dyn KvStore>,
    prefix: String,
    hits: u64,
    misses: u64,
    _value: PhantomData<fn() -> V>,
}

impl<V> PersistentTier<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Create a tier storing records under `prefix` in `store`.
    pub fn new(store: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            hits: 0,
            misses: 0,
            _value: PhantomData,
        }
    }

    /// The storage key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Look up a live value, counting a hit or a miss.
    pub fn get(&mut self, key: &str, now: u64) -> Option<V> {
        self.get_record(key, now).map(|record| record.data)
    }

    /// Look up a live record, counting a hit or a miss.
    ///
    /// A hit refreshes `last_access` and `access_count` in the store.
    pub fn get_record(&mut self, key: &str, now: u64) -> Option<CacheRecord<V>> {
        let storage_key = self.storage_key(key);

        let raw = match self.store.get(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.misses += 1;
                return None;
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Persistent tier read failed");
                self.misses += 1;
                return None;
            }
        };

        let mut record: CacheRecord<V> = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, key = %key, "Discarding corrupt persistent record");
                self.remove_quietly(&storage_key);
                self.misses += 1;
                return None;
            }
        };

        if record.is_expired(now) {
            debug!(key = %key, "Persistent tier entry expired on read");
            self.remove_quietly(&storage_key);
            self.misses += 1;
            return None;
        }

        record.touch(now);
        match serde_json::to_string(&record) {
            Ok(updated) => {
                if let Err(e) = self.store.set(&storage_key, &updated) {
                    debug!(error = %e, key = %key, "Could not refresh access metadata");
                }
            }
            Err(e) => debug!(error = %e, key = %key, "Could not encode access metadata"),
        }

        self.hits += 1;
        Some(record)
    }

    /// Write `data` under `key` with the given TTL.
    ///
    /// Returns whether the record reached the store. Failures are logged
    /// and otherwise ignored.
    pub fn set(&mut self, key: &str, data: &V, ttl: Duration, now: u64) -> bool {
        let storage_key = self.storage_key(key);
        let encoded = match serde_json::to_string(&CacheRecord::new(data, now, ttl)) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, key = %key, "Cannot encode value for persistent tier");
                return false;
            }
        };

        match self.store.set(&storage_key, &encoded) {
            Ok(()) => true,
            Err(e) if e.is_quota_exceeded() => {
                warn!(error = %e, key = %key, "Persistent store full, sweeping expired entries");
                self.sweep_expired(now);
                match self.store.set(&storage_key, &encoded) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, key = %key, "Dropping persistent write after retry");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, key = %key, "Dropping persistent write");
                false
            }
        }
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        match self.store.remove(&storage_key) {
            Ok(existed) => existed,
            Err(e) => {
                warn!(error = %e, key = %key, "Persistent tier delete failed");
                false
            }
        }
    }

    /// Remove every record this tier owns and return how many were removed.
    pub fn clear(&mut self) -> usize {
        self.owned_storage_keys()
            .into_iter()
            .filter(|(storage_key, _)| self.remove_quietly(storage_key))
            .count()
    }

    /// Remove expired and corrupt records and return how many were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        self.sweep_expired_keys(now).len()
    }

    /// Remove expired and corrupt records and return their cache keys.
    pub fn sweep_expired_keys(&mut self, now: u64) -> Vec<String> {
        let mut removed = Vec::new();
        for (storage_key, key) in self.owned_storage_keys() {
            let dead = match self.read_slot(&storage_key) {
                Slot::Missing => false,
                Slot::Corrupt => true,
                Slot::Present(meta) => meta.is_expired(now),
            };
            if dead && self.remove_quietly(&storage_key) {
                removed.push(key);
            }
        }
        removed
    }

    /// Metadata of a live record without touching it or the counters.
    pub fn peek(&self, key: &str, now: u64) -> Option<RecordMetadata> {
        match self.read_slot(&self.storage_key(key)) {
            Slot::Present(meta) if !meta.is_expired(now) => Some(meta),
            _ => None,
        }
    }

    /// Whether a live record exists for `key`.
    pub fn contains(&self, key: &str, now: u64) -> bool {
        self.peek(key, now).is_some()
    }

    /// Cache keys of all live records, sorted.
    pub fn keys(&self, now: u64) -> Vec<String> {
        let mut keys: Vec<String> = self
            .owned_storage_keys()
            .into_iter()
            .filter(|(storage_key, _)| {
                matches!(self.read_slot(storage_key), Slot::Present(meta) if !meta.is_expired(now))
            })
            .map(|(_, key)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Hit/miss counters with the number of live records, which the caller
    /// has from [`keys`](Self::keys).
    pub fn stats_with_size(&self, size: usize) -> TierStats {
        TierStats {
            hits: self.hits,
            misses: self.misses,
            size,
        }
    }

    /// Bytes the underlying store charges against its quota.
    ///
    /// Covers the whole store, including data this tier does not own.
    pub fn usage_bytes(&self) -> u64 {
        self.store.usage_bytes()
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Map a raw storage key to the cache key it holds, if this tier owns it.
    fn cache_key<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            key::is_recognized(storage_key).then_some(storage_key)
        } else {
            storage_key.strip_prefix(self.prefix.as_str())
        }
    }

    /// All (storage key, cache key) pairs owned by this tier.
    fn owned_storage_keys(&self) -> Vec<(String, String)> {
        let all = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Cannot enumerate persistent store");
                return Vec::new();
            }
        };
        all.iter()
            .filter_map(|storage_key| {
                self.cache_key(storage_key)
                    .map(|key| (storage_key.clone(), key.to_string()))
            })
            .collect()
    }

    fn read_slot(&self, storage_key: &str) -> Slot {
        match self.store.get(storage_key) {
            Ok(Some(raw)) => match serde_json::from_str::<CacheRecord<IgnoredAny>>(&raw) {
                Ok(record) => Slot::Present(record.metadata()),
                Err(_) => Slot::Corrupt,
            },
            Ok(None) => Slot::Missing,
            Err(e) => {
                debug!(error = %e, storage_key, "Persistent tier metadata read failed");
                Slot::Missing
            }
        }
    }

    fn remove_quietly(&self, storage_key: &str) -> bool {
        match self.store.remove(storage_key) {
            Ok(existed) => existed,
            Err(e) => {
                warn!(error = %e, storage_key, "Failed to remove persistent record");
                false
            }
        }
    }
}

impl<V> std::fmt::Debug for PersistentTier<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentTier")
            .field("prefix", &self.prefix)
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::cache::traits::StoreError;

    /// Store whose next write fails the way a full disk does.
    #[derive(Default)]
    struct DiskFullOnce {
        inner: MemoryStore,
        fail_next_set: AtomicBool,
    }

    impl KvStore for DiskFullOnce {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_next_set.swap(false, Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "no space left").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }

        fn usage_bytes(&self) -> u64 {
            self.inner.usage_bytes()
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    fn tier_with_store(prefix: &str) -> (PersistentTier<String>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let tier = PersistentTier::new(store.clone() as Arc<dyn KvStore>, prefix);
        (tier, store)
    }

    #[test]
    fn test_set_then_get() {
        let (mut tier, store) = tier_with_store("cache:");
        assert!(tier.set("geocode:Paris", &"48.8,2.3".to_string(), HOUR, 0));

        assert!(store.get("cache:geocode:Paris").unwrap().is_some());
        assert_eq!(tier.get("geocode:Paris", 0).as_deref(), Some("48.8,2.3"));
        assert_eq!(tier.stats_with_size(0).hits, 1);
    }

    #[test]
    fn test_hit_persists_access_metadata() {
        let (mut tier, _store) = tier_with_store("cache:");
        tier.set("k", &"v".to_string(), HOUR, 0);
        tier.get("k", 10);
        tier.get("k", 20);

        let meta = tier.peek("k", 20).unwrap();
        assert_eq!(meta.last_access, 20);
        assert_eq!(meta.access_count, 3);
    }

    #[test]
    fn test_expired_record_removed_on_read() {
        let (mut tier, store) = tier_with_store("cache:");
        tier.set("k", &"v".to_string(), Duration::from_millis(5), 0);

        assert_eq!(tier.get("k", 6), None);
        assert_eq!(store.get("cache:k").unwrap(), None);
        assert_eq!(tier.stats_with_size(0).misses, 1);
    }

    #[test]
    fn test_corrupt_record_is_miss_and_deleted() {
        let (mut tier, store) = tier_with_store("cache:");
        store.set("cache:k", "{not json").unwrap();

        assert_eq!(tier.get("k", 0), None);
        assert_eq!(store.get("cache:k").unwrap(), None);
        assert_eq!(tier.stats_with_size(0).misses, 1);
    }

    #[test]
    fn test_wrong_value_shape_is_corrupt() {
        let (mut tier, store) = tier_with_store("cache:");
        store
            .set(
                "cache:k",
                r#"{"data":42,"expiresAt":100,"lastAccess":0,"accessCount":1}"#,
            )
            .unwrap();

        assert_eq!(tier.get("k", 0), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_full_recovers_by_sweeping() {
        let store = Arc::new(MemoryStore::with_quota(140));
        let mut tier: PersistentTier<String> =
            PersistentTier::new(store.clone() as Arc<dyn KvStore>, "cache:");

        assert!(tier.set("old", &"x".repeat(20), Duration::from_millis(10), 0));
        // Second record does not fit next to the first
        assert!(tier.set("new", &"y".repeat(20), HOUR, 50));

        assert_eq!(tier.keys(50), vec!["new"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_full_drops_write_silently() {
        let store = Arc::new(MemoryStore::with_quota(140));
        let mut tier: PersistentTier<String> =
            PersistentTier::new(store.clone() as Arc<dyn KvStore>, "cache:");

        assert!(tier.set("live", &"x".repeat(20), HOUR, 0));
        assert!(!tier.set("other", &"y".repeat(20), HOUR, 0));

        assert_eq!(tier.keys(0), vec!["live"]);
        assert_eq!(tier.get("other", 0), None);
    }

    #[test]
    fn test_full_disk_recovers_by_sweeping() {
        let store = Arc::new(DiskFullOnce::default());
        let mut tier: PersistentTier<String> =
            PersistentTier::new(store.clone() as Arc<dyn KvStore>, "cache:");

        assert!(tier.set("old", &"x".to_string(), Duration::from_millis(10), 0));
        store.fail_next_set.store(true, Ordering::SeqCst);

        assert!(tier.set("new", &"y".to_string(), HOUR, 50));
        assert_eq!(store.keys().unwrap(), vec!["cache:new"]);
        assert_eq!(tier.get("new", 50).as_deref(), Some("y"));
    }

    #[test]
    fn test_stats_with_size_keeps_counters() {
        let (mut tier, store) = tier_with_store("cache:");
        tier.set("k", &"v".to_string(), HOUR, 0);
        tier.get("k", 0);
        tier.get("missing", 0);

        assert_eq!(tier.stats_with_size(7), TierStats { hits: 1, misses: 1, size: 7 });
        assert_eq!(tier.usage_bytes(), store.usage_bytes());
        assert!(tier.usage_bytes() > 0);
    }

    #[test]
    fn test_prefix_scopes_keys_and_clear() {
        let (mut tier, store) = tier_with_store("cache:");
        store.set("timearea_routes", "[]").unwrap();
        store.set("theme", "dark").unwrap();
        tier.set("a", &"1".to_string(), HOUR, 0);
        tier.set("b", &"2".to_string(), HOUR, 0);

        assert_eq!(tier.keys(0), vec!["a", "b"]);
        assert_eq!(tier.clear(), 2);
        assert_eq!(store.keys().unwrap(), vec!["theme", "timearea_routes"]);
    }

    #[test]
    fn test_empty_prefix_uses_recognized_namespaces() {
        let (mut tier, store) = tier_with_store("");
        store.set("timearea_routes", "[]").unwrap();
        tier.set("geocode:Paris", &"p".to_string(), HOUR, 0);
        tier.set("weather:1:2:d:t", &"w".to_string(), HOUR, 0);

        assert_eq!(tier.keys(0), vec!["geocode:Paris", "weather:1:2:d:t"]);
        assert_eq!(tier.sweep_expired(u64::MAX), 2);
        assert_eq!(store.keys().unwrap(), vec!["timearea_routes"]);
    }

    #[test]
    fn test_sweep_removes_expired_and_corrupt() {
        let (mut tier, store) = tier_with_store("cache:");
        tier.set("short", &"s".to_string(), Duration::from_millis(10), 0);
        tier.set("long", &"l".to_string(), HOUR, 0);
        store.set("cache:broken", "garbage").unwrap();

        assert_eq!(tier.sweep_expired(11), 2);
        assert_eq!(tier.keys(11), vec!["long"]);
    }

    #[test]
    fn test_peek_does_not_count_or_touch() {
        let (mut tier, _store) = tier_with_store("cache:");
        tier.set("k", &"v".to_string(), HOUR, 0);
        tier.peek("k", 5);
        tier.peek("missing", 5);

        let stats = tier.stats_with_size(0);
        assert_eq!((stats.hits, stats.misses), (0, 0));
        assert_eq!(tier.peek("k", 5).unwrap().access_count, 1);
    }

    #[test]
    fn test_delete() {
        let (mut tier, _store) = tier_with_store("cache:");
        tier.set("k", &"v".to_string(), HOUR, 0);

        assert!(tier.delete("k"));
        assert!(!tier.delete("k"));
        assert!(!tier.contains("k", 0));
    }
}
