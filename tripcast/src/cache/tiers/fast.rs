//! Bounded in-memory tier with LRU eviction and per-entry TTL.
//!
//! Entries live in an [`LruCache`], which keeps them in access order: every
//! successful read or write moves a key to the front, and a write of a new
//! key into a full tier evicts the back. With a clock that never runs
//! backwards this is the entry with the smallest `last_access`, and the
//! order of calls breaks ties within the same millisecond.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tracing::trace;

use crate::cache::record::{CacheRecord, RecordMetadata};
use crate::cache::stats::TierStats;

/// The fast tier: a capacity-bounded map of live records.
pub struct FastTier<V> {
    entries: LruCache<String, CacheRecord<V>>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> FastTier<V> {
    /// Create a tier holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Look up a live value, counting a hit or a miss.
    ///
    /// An expired entry is removed on sight and reported as a miss.
    pub fn get(&mut self, key: &str, now: u64) -> Option<V> {
        let expired = match self.entries.peek(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(record) => record.is_expired(now),
        };

        if expired {
            self.entries.pop(key);
            self.misses += 1;
            trace!(key, "Fast tier entry expired on read");
            return None;
        }

        // get_mut moves the key to the most recently used position
        let record = self.entries.get_mut(key)?;
        record.touch(now);
        self.hits += 1;
        Some(record.data.clone())
    }

    /// Insert or replace `key`, evicting the least recently used entry if
    /// the tier is full and `key` is new.
    pub fn set(&mut self, key: &str, data: V, ttl: Duration, now: u64) {
        let record = CacheRecord::new(data, now, ttl);
        if let Some((evicted, _)) = self.entries.push(key.to_string(), record) {
            if evicted != key {
                trace!(key = %evicted, "Evicted least recently used fast tier entry");
            }
        }
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Remove every entry. Hit and miss counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove every expired entry and return how many were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        self.sweep_expired_keys(now).len()
    }

    /// Remove every expired entry and return the removed keys.
    pub fn sweep_expired_keys(&mut self, now: u64) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, record)| record.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.entries.pop(key.as_str());
        }
        expired
    }

    /// Metadata of a live entry without touching it, its recency or the
    /// counters.
    pub fn peek(&self, key: &str, now: u64) -> Option<RecordMetadata> {
        self.entries
            .peek(key)
            .filter(|record| !record.is_expired(now))
            .map(CacheRecord::metadata)
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str, now: u64) -> bool {
        self.peek(key, now).is_some()
    }

    /// Keys of all live entries, sorted.
    pub fn keys(&self, now: u64) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, record)| !record.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Hit/miss counters and the number of live entries.
    pub fn stats(&self, now: u64) -> TierStats {
        TierStats {
            hits: self.hits,
            misses: self.misses,
            size: self
                .entries
                .iter()
                .filter(|(_, record)| !record.is_expired(now))
                .count(),
        }
    }
}
