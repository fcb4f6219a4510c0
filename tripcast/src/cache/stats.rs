//! Hit/miss accounting for the cache tiers.

use std::fmt;

/// Counters for a single tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierStats {
    /// Successful reads since the tier was created.
    pub hits: u64,
    /// Reads that found nothing live.
    pub misses: u64,
    /// Live entries currently held.
    pub size: usize,
}

/// Counters for the cache as a whole.
///
/// `hits` and `misses` count lookups made through the coordinator: a read
/// that falls through both tiers is one miss, not two. `size` is the number
/// of distinct live keys across both tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TotalStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    /// `hits / (hits + misses)`, or `0.0` before the first read.
    pub hit_rate: f64,
}

impl TotalStats {
    pub fn new(hits: u64, misses: u64, size: usize) -> Self {
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        };
        Self {
            hits,
            misses,
            size,
            hit_rate,
        }
    }
}

/// Statistics reported by [`TieredCache::stats`](super::TieredCache::stats).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub fast_tier: TierStats,
    pub persistent_tier: TierStats,
    pub total: TotalStats,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fast {}/{} hit/miss ({} entries), persistent {}/{} hit/miss ({} entries), hit rate {:.1}%",
            self.fast_tier.hits,
            self.fast_tier.misses,
            self.fast_tier.size,
            self.persistent_tier.hits,
            self.persistent_tier.misses,
            self.persistent_tier.size,
            self.total.hit_rate * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_zero_without_lookups() {
        let total = TotalStats::new(0, 0, 0);
        assert_eq!(total.hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let total = TotalStats::new(3, 1, 2);
        assert_eq!(total.hit_rate, 0.75);
    }

    #[test]
    fn test_display() {
        let stats = CacheStats {
            fast_tier: TierStats {
                hits: 1,
                misses: 1,
                size: 1,
            },
            persistent_tier: TierStats::default(),
            total: TotalStats::new(1, 1, 1),
        };
        assert!(stats.to_string().contains("hit rate 50.0%"));
    }
}
