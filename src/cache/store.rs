//! Cache Store Module
//!
//! Main cache engine: an entry table keyed by string, a coalescing dispatcher
//! that runs at most one production per key, and an eviction pass run after
//! every completed production.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::cache::{eviction, CacheEntry, CacheStats, DEFAULT_CAPACITY};
use crate::error::{CacheError, Result};

type ProducerFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;
type Producer<T> = Arc<dyn Fn(String) -> ProducerFuture<T> + Send + Sync>;
type Waiter<T> = oneshot::Sender<Result<T>>;

// == Entry Table ==
/// Mutable state of one cache instance, guarded by a single lock.
struct Table<T> {
    /// Key to latest entry snapshot
    entries: HashMap<String, CacheEntry<T>>,
    /// Keys with a running production, and the callers waiting on each
    in_flight: HashMap<String, Vec<Waiter<T>>>,
    /// Number of entries; kept equal to `entries.len()`
    size: usize,
    /// Last revision handed out
    revision: u64,
    stats: CacheStats,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            size: 0,
            revision: 0,
            stats: CacheStats::new(),
        }
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Replaces the entry for its key, counting it if the key was absent.
    fn put(&mut self, entry: CacheEntry<T>) {
        if self.entries.insert(entry.key.clone(), entry).is_none() {
            self.size += 1;
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.size -= 1;
            true
        } else {
            false
        }
    }
}

struct Shared<T> {
    name: String,
    capacity: usize,
    producer: Producer<T>,
    table: Mutex<Table<T>>,
    evicting: AtomicBool,
}

/// Clears the eviction flag on every exit path of a pass.
struct EvictionGuard<'a>(&'a AtomicBool);

impl Drop for EvictionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Keyed Async Cache ==
/// Memoizing cache over an asynchronous producer.
///
/// Cloning the handle is cheap; all clones share the same entry table.
pub struct KeyedAsyncCache<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for KeyedAsyncCache<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for KeyedAsyncCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedAsyncCache")
            .field("name", &self.shared.name)
            .field("capacity", &self.shared.capacity)
            .field("len", &self.len())
            .finish()
    }
}

impl<T> KeyedAsyncCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache around a producer.
    ///
    /// # Arguments
    /// * `name` - Name used in logs and by the registry
    /// * `capacity` - Size that triggers eviction; `0` selects [`DEFAULT_CAPACITY`]
    /// * `producer` - Computes the value for a key on a miss
    pub fn new<F, Fut>(name: impl Into<String>, capacity: usize, producer: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        let producer: Producer<T> = Arc::new(move |key| Box::pin(producer(key)));

        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                capacity,
                producer,
                table: Mutex::new(Table::new()),
                evicting: AtomicBool::new(false),
            }),
        }
    }

    // == Get ==
    /// Returns the value for `key`, producing it if needed.
    ///
    /// A resolved entry is returned without calling the producer. A missing,
    /// pending or errored entry makes the caller wait for the next production
    /// of that key, starting one unless it is already running. Errors are not
    /// cached as hits: every lookup of a failed key retries the producer.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn get(&self, key: &str) -> Result<T> {
        let receiver = {
            let mut guard = self.shared.table.lock();
            let table = &mut *guard;

            if let Some(value) = table.entries.get(key).and_then(CacheEntry::value).cloned() {
                table.stats.record_hit();
                return Ok(value);
            }

            table.stats.record_miss(table.in_flight.contains_key(key));
            self.shared.dispatch(table, key);

            let (sender, receiver) = oneshot::channel();
            table
                .in_flight
                .entry(key.to_string())
                .or_default()
                .push(sender);
            receiver
        };

        receiver
            .await
            .unwrap_or_else(|_| Err(CacheError::Abandoned(key.to_string())))
    }

    // == Request Production ==
    /// Starts a production for `key` unless one is already in flight.
    ///
    /// Completion is observed through [`get`](Self::get), not through this
    /// call. Useful for warming a cache ahead of lookups.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime and a production must start.
    pub fn request_production(&self, key: &str) {
        let mut table = self.shared.table.lock();
        self.shared.dispatch(&mut table, key);
    }

    // == Maybe Evict ==
    /// Runs an eviction pass if the cache is at or above capacity.
    ///
    /// Returns the number of entries removed. A call made while another pass
    /// is running is dropped and returns 0.
    pub fn maybe_evict(&self) -> usize {
        self.shared.maybe_evict()
    }
}

impl<T> KeyedAsyncCache<T> {
    // == Remove ==
    /// Removes the entry for `key`, pending or not.
    ///
    /// Does not cancel a running production: its waiters are still answered
    /// when it resolves, and the resolved entry is written back.
    pub fn remove(&self, key: &str) -> bool {
        self.remove_all([key]) == 1
    }

    /// Removes every listed key, returning how many were present.
    pub fn remove_all<I, S>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = self.shared.table.lock();
        let removed = keys
            .into_iter()
            .filter(|key| table.delete(key.as_ref()))
            .count();
        table.stats.record_removals(removed);

        if removed > 0 {
            debug!(cache = %self.shared.name, removed, "removed entries");
        }
        removed
    }

    // == Inspection ==
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Returns the current number of entries, pending ones included.
    pub fn len(&self) -> usize {
        self.shared.table.lock().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if an entry exists for `key`, in any state.
    pub fn contains(&self, key: &str) -> bool {
        self.shared.table.lock().entries.contains_key(key)
    }

    /// Returns a snapshot of the entry for `key` without triggering production.
    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>>
    where
        T: Clone,
    {
        self.shared.table.lock().entries.get(key).cloned()
    }

    /// Counts table entries directly, bypassing the size counter.
    #[cfg(test)]
    pub(crate) fn table_len(&self) -> usize {
        self.shared.table.lock().entries.len()
    }

    /// Returns the number of keys in flight and the waiters parked on them.
    #[cfg(test)]
    pub(crate) fn in_flight_counts(&self) -> (usize, usize) {
        let table = self.shared.table.lock();
        let waiters = table.in_flight.values().map(Vec::len).sum();
        (table.in_flight.len(), waiters)
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let table = self.shared.table.lock();
        let mut stats = table.stats.clone();
        stats.set_total_entries(table.size);
        stats
    }
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Dispatch ==
    /// Marks `key` pending and starts its production, with the table locked.
    ///
    /// Marking and starting happen under the same lock, so two callers can
    /// never both start a production for one key.
    fn dispatch(self: &Arc<Self>, table: &mut Table<T>, key: &str) {
        if table.entries.get(key).is_some_and(CacheEntry::is_pending) {
            return;
        }

        let revision = table.next_revision();
        table.put(CacheEntry::pending(key, revision));

        // A removed pending entry may still have its production running
        if table.in_flight.contains_key(key) {
            return;
        }
        table.in_flight.insert(key.to_string(), Vec::new());
        table.stats.record_production();

        self.spawn_production(key.to_string());
    }

    /// Runs the producer on its own task and resolves the entry afterwards.
    ///
    /// The producer is invoked inside a nested task so a panic surfaces as a
    /// `JoinError` and the key is resolved as failed instead of staying pending.
    fn spawn_production(self: &Arc<Self>, key: String) {
        let shared = Arc::clone(self);

        tokio::spawn(async move {
            debug!(cache = %shared.name, key = %key, "producing value");

            let producer = Arc::clone(&shared.producer);
            let task_key = key.clone();
            let result = match tokio::spawn(async move { producer(task_key).await }).await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::Error::new(join_error).context("producer task aborted")),
            };

            shared.resolve(&key, result);
        });
    }

    // == Resolve ==
    /// Writes a production's outcome and answers everyone waiting on it.
    fn resolve(&self, key: &str, result: anyhow::Result<T>) {
        let outcome = result.map_err(|error| {
            warn!(cache = %self.name, key = %key, error = %format!("{error:#}"), "producer failed");
            CacheError::Producer {
                key: key.to_string(),
                error: Arc::new(error),
            }
        });

        let waiters = {
            let mut guard = self.table.lock();
            let table = &mut *guard;

            if outcome.is_err() {
                table.stats.record_failure();
            }
            let revision = table.next_revision();
            table.put(CacheEntry::resolved(key, outcome.clone(), revision));
            table.in_flight.remove(key).unwrap_or_default()
        };

        for waiter in waiters {
            // The receiving get was dropped; nothing to deliver
            let _ = waiter.send(outcome.clone());
        }

        self.maybe_evict();
    }

    // == Eviction Pass ==
    fn maybe_evict(&self) -> usize {
        if self
            .evicting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return 0;
        }
        let _eviction = EvictionGuard(&self.evicting);

        let removed = {
            let mut table = self.table.lock();
            if table.size < self.capacity {
                return 0;
            }

            let quota = eviction::eviction_quota(self.capacity);
            let victims = eviction::select_victims(table.entries.values(), quota);
            let removed = victims.iter().filter(|key| table.delete(key)).count();
            table.stats.record_eviction_pass(removed);
            removed
        };

        if removed > 0 {
            info!(cache = %self.name, removed, capacity = self.capacity, "evicted entries");
        } else {
            debug!(cache = %self.name, capacity = self.capacity, "eviction pass found nothing to remove");
        }
        removed
    }
}
