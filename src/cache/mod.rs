//! Cache Module
//!
//! Provides a keyed asynchronous memoization cache with request coalescing,
//! error-first eviction and a named registry.

mod entry;
mod eviction;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EntryState};
pub use eviction::{eviction_quota, select_victims};
pub use registry::CacheRegistry;
pub use stats::CacheStats;
pub use store::KeyedAsyncCache;

// == Public Constants ==
/// Capacity used when none (or zero) is given
pub const DEFAULT_CAPACITY: usize = 10_000;
