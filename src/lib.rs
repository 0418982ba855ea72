//! Local Store - A keyed asynchronous memoization cache
//!
//! Serves repeated lookups from memory, runs at most one production per key
//! under concurrent callers, and bounds its size by evicting failed results
//! before successful ones.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, CacheRegistry, CacheStats, KeyedAsyncCache, DEFAULT_CAPACITY};
pub use config::Config;
pub use error::{CacheError, Result};
