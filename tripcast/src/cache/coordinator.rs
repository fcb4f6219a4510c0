//! The two-tier cache coordinator.
//!
//! [`TieredCache`] is the only cache interface consumers see. It composes a
//! bounded [`FastTier`] with a durable [`PersistentTier`]:
//!
//! ```text
//!            get(key)                          set(key, value, ttl)
//!               │                                     │
//!               ▼                                     ├──────────────┐
//!        ┌─────────────┐  hit                         ▼              ▼
//!        │  FastTier   │──────► value          ┌───────────┐  ┌────────────────┐
//!        └──────┬──────┘                       │ FastTier  │  │ PersistentTier │
//!               │ miss                         └───────────┘  └────────────────┘
//!               ▼
//!     ┌──────────────────┐  hit
//!     │  PersistentTier  │──────► promote to FastTier (remaining TTL) ──► value
//!     └────────┬─────────┘
//!              │ miss
//!              ▼
//!            None
//! ```
//!
//! # Locking
//!
//! One mutex guards both tiers. A read that promotes a value performs a
//! persistent read followed by a fast write, and concurrent callers must
//! see that as a single step.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::key::KeyKind;
use super::record::RecordMetadata;
use super::stats::{CacheStats, TotalStats};
use super::tiers::{FastTier, PersistentTier};
use super::traits::KvStore;

/// A cache holding arbitrary JSON values, as used by the lookup clients.
pub type JsonCache = TieredCache<serde_json::Value>;

/// Where a key currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Fast,
    Persistent,
    /// Not cached, or expired.
    Absent,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::Persistent => "persistent",
            Tier::Absent => "none",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic view of one key, as returned by [`TieredCache::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    /// The tier that answers reads for this key.
    pub tier: Tier,
    /// Metadata of the record in that tier. `None` when absent.
    pub metadata: Option<RecordMetadata>,
}

impl EntryInfo {
    fn absent() -> Self {
        Self {
            tier: Tier::Absent,
            metadata: None,
        }
    }
}

/// One row of [`TieredCache::inventory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub key: String,
    pub kind: KeyKind,
    pub info: EntryInfo,
}

struct Tiers<V> {
    fast: FastTier<V>,
    persistent: PersistentTier<V>,
    hits: u64,
    misses: u64,
}

impl<V> Tiers<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    fn live_keys(&self, now: u64) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.fast.keys(now).into_iter().collect();
        keys.extend(self.persistent.keys(now));
        keys
    }

    fn describe(&self, key: &str, now: u64) -> EntryInfo {
        if let Some(meta) = self.fast.peek(key, now) {
            return EntryInfo {
                tier: Tier::Fast,
                metadata: Some(meta),
            };
        }
        if let Some(meta) = self.persistent.peek(key, now) {
            return EntryInfo {
                tier: Tier::Persistent,
                metadata: Some(meta),
            };
        }
        EntryInfo::absent()
    }

    fn delete(&mut self, key: &str) -> bool {
        let fast = self.fast.delete(key);
        let persistent = self.persistent.delete(key);
        fast || persistent
    }
}

/// Two-tier read-through/write-through cache.
///
/// Construct one per application and share it with `Arc`.
pub struct TieredCache<V> {
    tiers: Mutex<Tiers<V>>,
    clock: Arc<dyn Clock>,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Create a cache over `store`.
    ///
    /// # Arguments
    ///
    /// * `fast_capacity` - Maximum entries in the fast tier
    /// * `prefix` - Storage key prefix for the persistent tier
    /// * `store` - Durable store backing the persistent tier
    /// * `clock` - Time source for expiry and LRU ordering
    pub fn new(
        fast_capacity: usize,
        prefix: impl Into<String>,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tiers: Mutex::new(Tiers {
                fast: FastTier::new(fast_capacity),
                persistent: PersistentTier::new(store, prefix),
                hits: 0,
                misses: 0,
            }),
            clock,
        }
    }

    /// Create a cache using the system clock.
    pub fn with_system_clock(
        fast_capacity: usize,
        prefix: impl Into<String>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        Self::new(fast_capacity, prefix, store, Arc::new(SystemClock))
    }

    /// Look up `key`.
    ///
    /// Checks the fast tier first. A value found only in the persistent tier
    /// is promoted into the fast tier for the rest of its original lifetime.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let mut tiers = self.tiers.lock();

        if let Some(value) = tiers.fast.get(key, now) {
            tiers.hits += 1;
            return Some(value);
        }

        let Some(record) = tiers.persistent.get_record(key, now) else {
            tiers.misses += 1;
            return None;
        };

        if let Some(remaining) = record.remaining_ttl(now) {
            tiers.fast.set(key, record.data.clone(), remaining, now);
            trace!(key, remaining_ms = remaining.as_millis() as u64, "Promoted to fast tier");
        }
        tiers.hits += 1;
        Some(record.data)
    }

    /// Store `data` under `key` in both tiers for `ttl`.
    ///
    /// Never fails. If the persistent write is dropped the value is still
    /// served from the fast tier until it expires or is evicted.
    pub fn set(&self, key: &str, data: V, ttl: Duration) {
        let now = self.clock.now_millis();
        let mut tiers = self.tiers.lock();
        tiers.persistent.set(key, &data, ttl, now);
        tiers.fast.set(key, data, ttl, now);
    }

    /// Remove `key` from both tiers. Returns `true` if either held it.
    pub fn delete(&self, key: &str) -> bool {
        self.tiers.lock().delete(key)
    }

    /// Remove every entry from both tiers.
    pub fn clear(&self) {
        let mut tiers = self.tiers.lock();
        tiers.fast.clear();
        let removed = tiers.persistent.clear();
        debug!(persistent_removed = removed, "Cleared cache");
    }

    /// Whether either tier holds a live entry for `key`.
    ///
    /// Does not count as a lookup. Prefer [`get`](Self::get) when the value
    /// is needed.
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_millis();
        let tiers = self.tiers.lock();
        tiers.fast.contains(key, now) || tiers.persistent.contains(key, now)
    }

    /// Remove expired entries from both tiers.
    ///
    /// Returns the number of distinct keys removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut tiers = self.tiers.lock();
        let mut removed: BTreeSet<String> =
            tiers.fast.sweep_expired_keys(now).into_iter().collect();
        removed.extend(tiers.persistent.sweep_expired_keys(now));
        removed.len()
    }

    /// Per-tier and combined statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let tiers = self.tiers.lock();
        // Decode the persistent records once for both the tier size and the total
        let persistent_keys = tiers.persistent.keys(now);
        let persistent_tier = tiers.persistent.stats_with_size(persistent_keys.len());
        let mut live: BTreeSet<String> = tiers.fast.keys(now).into_iter().collect();
        live.extend(persistent_keys);
        CacheStats {
            fast_tier: tiers.fast.stats(now),
            persistent_tier,
            total: TotalStats::new(tiers.hits, tiers.misses, live.len()),
        }
    }

    /// Bytes used by the whole durable store, cache records included.
    pub fn store_usage_bytes(&self) -> u64 {
        self.tiers.lock().persistent.usage_bytes()
    }

    /// Every live key in either tier, sorted and deduplicated.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_millis();
        self.tiers.lock().live_keys(now).into_iter().collect()
    }

    /// Report where `key` lives and its metadata.
    ///
    /// Read-only: does not count as a lookup, does not update LRU order and
    /// does not promote.
    pub fn describe(&self, key: &str) -> EntryInfo {
        let now = self.clock.now_millis();
        self.tiers.lock().describe(key, now)
    }

    /// Every live key with its kind and metadata, sorted by key.
    pub fn inventory(&self) -> Vec<InventoryItem> {
        let now = self.clock.now_millis();
        let tiers = self.tiers.lock();
        tiers
            .live_keys(now)
            .into_iter()
            .map(|key| {
                let info = tiers.describe(&key, now);
                InventoryItem {
                    kind: KeyKind::classify(&key),
                    key,
                    info,
                }
            })
            .collect()
    }

    /// Delete every live key of one kind. Returns how many were deleted.
    pub fn delete_kind(&self, kind: KeyKind) -> usize {
        let now = self.clock.now_millis();
        let mut tiers = self.tiers.lock();
        let doomed: Vec<String> = tiers
            .live_keys(now)
            .into_iter()
            .filter(|key| KeyKind::classify(key) == kind)
            .collect();
        for key in &doomed {
            tiers.delete(key);
        }
        debug!(kind = %kind, removed = doomed.len(), "Deleted cache entries by kind");
        doomed.len()
    }

    /// Drop `key` from the fast tier only, leaving the persistent copy.
    ///
    /// The next [`get`](Self::get) promotes it back.
    pub fn demote(&self, key: &str) -> bool {
        self.tiers.lock().fast.delete(key)
    }

    /// Maximum number of entries in the fast tier.
    pub fn fast_capacity(&self) -> usize {
        self.tiers.lock().fast.capacity()
    }

    /// Current time according to the cache's clock.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }
}

impl<V> fmt::Debug for TieredCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
