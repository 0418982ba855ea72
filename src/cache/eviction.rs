//! Eviction Module
//!
//! Chooses which entries to drop once a cache reaches its capacity.
//! Errored entries go first, then the oldest successful ones.

use crate::cache::CacheEntry;

/// Share of the capacity removed by one eviction pass, as a divisor (1/5 = 20%).
const EVICTION_DIVISOR: usize = 5;

// == Quota ==
/// Number of entries one pass removes: `ceil(capacity * 0.2)`.
pub fn eviction_quota(capacity: usize) -> usize {
    capacity.div_ceil(EVICTION_DIVISOR)
}

// == Select Victims ==
/// Picks the keys to evict from a set of entries.
///
/// Pending entries are never considered. The rest are ordered oldest first by
/// `last_updated` and split into errored and successful tiers:
/// - more errored entries than `quota`: only the oldest `quota` errored ones go
/// - otherwise every errored entry goes, and the oldest successful entries
///   fill the remainder, capped at however many exist
pub fn select_victims<'a, T: 'a>(
    entries: impl IntoIterator<Item = &'a CacheEntry<T>>,
    quota: usize,
) -> Vec<String> {
    let mut resolved: Vec<&CacheEntry<T>> = entries
        .into_iter()
        .filter(|entry| !entry.is_pending())
        .collect();
    resolved.sort_by_key(|entry| entry.age_key());

    let (errored, successful): (Vec<_>, Vec<_>) =
        resolved.into_iter().partition(|entry| entry.has_error());

    if errored.len() > quota {
        return errored
            .into_iter()
            .take(quota)
            .map(|entry| entry.key.clone())
            .collect();
    }

    let remaining = quota - errored.len();
    errored
        .into_iter()
        .chain(successful.into_iter().take(remaining))
        .map(|entry| entry.key.clone())
        .collect()
}
