//! Cache Statistics Module
//!
//! Tracks lookup, production and eviction counters for a cache instance.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups served from a resolved entry
    pub hits: u64,
    /// Lookups that had to wait for a production
    pub misses: u64,
    /// Misses that joined a production already in flight
    pub coalesced: u64,
    /// Producer invocations started
    pub productions: u64,
    /// Producer invocations that failed
    pub failures: u64,
    /// Entries removed by eviction passes
    pub evictions: u64,
    /// Eviction passes that removed at least one entry
    pub eviction_passes: u64,
    /// Entries removed through explicit invalidation
    pub removals: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// When the last effective eviction pass finished
    pub last_eviction_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a miss; `joined` is true when an in-flight production was reused.
    pub fn record_miss(&mut self, joined: bool) {
        self.misses += 1;
        if joined {
            self.coalesced += 1;
        }
    }

    pub fn record_production(&mut self) {
        self.productions += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    // == Record Eviction Pass ==
    /// Records one eviction pass that removed `count` entries.
    pub fn record_eviction_pass(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.evictions += count as u64;
        self.eviction_passes += 1;
        self.last_eviction_at = Some(Utc::now());
    }

    pub fn record_removals(&mut self, count: usize) {
        self.removals += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 0);
        assert!(stats.last_eviction_at.is_none());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss(false);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_miss_coalesced() {
        let mut stats = CacheStats::new();
        stats.record_miss(false);
        stats.record_miss(true);
        stats.record_miss(true);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.coalesced, 2);
    }

    #[test]
    fn test_record_eviction_pass() {
        let mut stats = CacheStats::new();
        stats.record_eviction_pass(0);
        assert_eq!(stats.eviction_passes, 0);
        assert!(stats.last_eviction_at.is_none());

        stats.record_eviction_pass(2);
        stats.record_eviction_pass(3);
        assert_eq!(stats.evictions, 5);
        assert_eq!(stats.eviction_passes, 2);
        assert!(stats.last_eviction_at.is_some());
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_production();
        stats.record_failure();
        stats.set_total_entries(7);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["productions"], 1);
        assert_eq!(json["failures"], 1);
        assert_eq!(json["total_entries"], 7);
        assert!(json["last_eviction_at"].is_null());
    }
}
