//! Cache Registry Module
//!
//! Maps cache names to typed cache handles so unrelated parts of a program can
//! share a cache by looking it up. The registry is an ordinary value: create
//! one at startup and pass it to whoever needs it.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::{KeyedAsyncCache, DEFAULT_CAPACITY};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Registry ==
/// Name to cache mapping. Registering an existing name replaces it.
pub struct CacheRegistry {
    caches: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
    default_capacity: usize,
}

impl CacheRegistry {
    // == Constructors ==
    /// Creates an empty registry using [`DEFAULT_CAPACITY`].
    pub fn new() -> Self {
        Self::with_default_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty registry whose `create` calls use `capacity`.
    pub fn with_default_capacity(capacity: usize) -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
            default_capacity: capacity,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_default_capacity(config.default_capacity)
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    // == Create ==
    /// Registers a cache with the registry's default capacity and returns it.
    pub fn create<T, F, Fut>(&self, name: &str, producer: F) -> KeyedAsyncCache<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.create_with_capacity(name, self.default_capacity, producer)
    }

    /// Registers a cache with an explicit capacity and returns it.
    ///
    /// A cache already registered under `name` is replaced; handles to the
    /// old instance keep working but are no longer reachable by name.
    pub fn create_with_capacity<T, F, Fut>(
        &self,
        name: &str,
        capacity: usize,
        producer: F,
    ) -> KeyedAsyncCache<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let cache = KeyedAsyncCache::new(name, capacity, producer);
        let replaced = self
            .caches
            .write()
            .insert(name.to_string(), Box::new(cache.clone()))
            .is_some();

        debug!(cache = %name, capacity = cache.capacity(), replaced, "registered cache");
        cache
    }

    // == Lookup ==
    /// Returns the cache registered under `name`, if it holds values of type `T`.
    pub fn get<T: 'static>(&self, name: &str) -> Option<KeyedAsyncCache<T>> {
        self.require(name).ok()
    }

    /// Like [`get`](Self::get) but reports why a lookup failed.
    pub fn require<T: 'static>(&self, name: &str) -> Result<KeyedAsyncCache<T>> {
        let caches = self.caches.read();
        let entry = caches
            .get(name)
            .ok_or_else(|| CacheError::NotFound(name.to_string()))?;

        entry
            .downcast_ref::<KeyedAsyncCache<T>>()
            .cloned()
            .ok_or_else(|| CacheError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}
