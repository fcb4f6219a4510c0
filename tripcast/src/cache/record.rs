//! The record shape shared by both cache tiers.
//!
//! All timestamps are milliseconds since the Unix epoch as reported by the
//! cache's [`Clock`](super::clock::Clock). Milliseconds keep the persisted
//! form compact and compatible with records written by the browser build.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A cached value together with its expiry and access metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord<V> {
    /// The cached value.
    pub data: V,

    /// Absolute expiry instant. The record is dead once `now > expires_at`.
    pub expires_at: u64,

    /// Last successful read (or the write time for fresh records).
    pub last_access: u64,

    /// Number of successful reads plus one for the initial write.
    pub access_count: u64,
}

impl<V> CacheRecord<V> {
    /// Create a fresh record written at `now` that lives for `ttl`.
    pub fn new(data: V, now: u64, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: now.saturating_add(ttl_millis(ttl)),
            last_access: now,
            access_count: 1,
        }
    }

    /// Whether the record is past its expiry at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, or `None` if nothing remains.
    pub fn remaining_ttl(&self, now: u64) -> Option<Duration> {
        if self.expires_at > now {
            Some(Duration::from_millis(self.expires_at - now))
        } else {
            None
        }
    }

    /// Record a successful read at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_access = now;
        self.access_count = self.access_count.saturating_add(1);
    }

    /// Expiry and access metadata without the value.
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            expires_at: self.expires_at,
            last_access: self.last_access,
            access_count: self.access_count,
        }
    }
}

/// Record metadata reported by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub expires_at: u64,
    pub last_access: u64,
    pub access_count: u64,
}

impl RecordMetadata {
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

/// Convert a TTL to whole milliseconds, saturating at `u64::MAX`.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
