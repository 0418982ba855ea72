//! Cache Entry Module
//!
//! Defines the record stored for each key: its resolution state and the
//! timestamp that orders entries for eviction.

use chrono::{DateTime, Utc};

use crate::error::CacheError;

// == Entry State ==
/// Resolution state of a cache entry.
#[derive(Debug, Clone)]
pub enum EntryState<T> {
    /// A production is in flight; no value or error yet
    Pending,
    /// The producer succeeded
    Ready(T),
    /// The producer failed
    Failed(CacheError),
}

// == Cache Entry ==
/// Snapshot of a single key's record.
///
/// Entries are replaced wholesale on every transition and never mutated in
/// place, so a reader always sees one consistent version.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The key this entry belongs to
    pub key: String,
    /// Pending, resolved or errored
    pub state: EntryState<T>,
    /// Time of the last transition
    pub last_updated: DateTime<Utc>,
    /// Per-instance transition counter, breaks ties between equal timestamps
    pub revision: u64,
}

impl<T> CacheEntry<T> {
    // == Constructors ==
    /// Creates a pending marker for a key.
    pub fn pending(key: impl Into<String>, revision: u64) -> Self {
        Self::with_state(key, EntryState::Pending, revision)
    }

    /// Creates an entry from a producer outcome.
    pub fn resolved(key: impl Into<String>, outcome: Result<T, CacheError>, revision: u64) -> Self {
        let state = match outcome {
            Ok(value) => EntryState::Ready(value),
            Err(err) => EntryState::Failed(err),
        };
        Self::with_state(key, state, revision)
    }

    fn with_state(key: impl Into<String>, state: EntryState<T>, revision: u64) -> Self {
        Self {
            key: key.into(),
            state,
            last_updated: Utc::now(),
            revision,
        }
    }

    // == Accessors ==
    pub fn is_pending(&self) -> bool {
        matches!(self.state, EntryState::Pending)
    }

    pub fn has_error(&self) -> bool {
        matches!(self.state, EntryState::Failed(_))
    }

    /// Returns the value if the entry resolved successfully.
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            EntryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the stored error if the entry resolved with a failure.
    pub fn error(&self) -> Option<&CacheError> {
        match &self.state {
            EntryState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Ordering key for eviction: oldest transition first.
    pub(crate) fn age_key(&self) -> (DateTime<Utc>, u64) {
        (self.last_updated, self.revision)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_pending_entry_carries_nothing() {
        let entry: CacheEntry<String> = CacheEntry::pending("k", 1);

        assert!(entry.is_pending());
        assert!(!entry.has_error());
        assert!(entry.value().is_none());
        assert!(entry.error().is_none());
    }

    #[test]
    fn test_resolved_ok_entry() {
        let entry = CacheEntry::resolved("k", Ok(42u32), 2);

        assert!(!entry.is_pending());
        assert!(!entry.has_error());
        assert_eq!(entry.value(), Some(&42));
        assert_eq!(entry.key, "k");
    }

    #[test]
    fn test_resolved_err_entry() {
        let err = CacheError::Producer {
            key: "k".to_string(),
            error: Arc::new(anyhow::anyhow!("nope")),
        };
        let entry: CacheEntry<u32> = CacheEntry::resolved("k", Err(err), 3);

        assert!(!entry.is_pending());
        assert!(entry.has_error());
        assert!(entry.value().is_none());
        assert!(entry.error().is_some_and(|e| e.is_producer_failure()));
    }

    #[test]
    fn test_age_key_breaks_ties_by_revision() {
        let older: CacheEntry<u32> = CacheEntry::pending("a", 1);
        let mut newer: CacheEntry<u32> = CacheEntry::pending("b", 2);
        newer.last_updated = older.last_updated;

        assert!(older.age_key() < newer.age_key());
    }

    #[test]
    fn test_timestamp_set_on_creation() {
        let before = Utc::now();
        let entry: CacheEntry<u32> = CacheEntry::pending("k", 0);
        let after = Utc::now();

        assert!(entry.last_updated >= before);
        assert!(entry.last_updated <= after);
    }
}
