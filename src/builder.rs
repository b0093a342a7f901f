//! Cache builder and configuration.
//!
//! Assembles a [`Cache`] from a store, an optional loader-writer, a
//! resilience strategy and the initial listeners, hiding the coordinator
//! wiring.
//!
//! ## Example
//!
//! ```rust
//! use cachekit_facade::builder::CacheBuilder;
//! use cachekit_facade::cache::Cache;
//!
//! let cache: Cache<u64, String> = CacheBuilder::new().shards(4).build();
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some(&"hello".to_string()));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::Cache;
use crate::coordinator::MutationCoordinator;
use crate::error::ConfigError;
use crate::event::{CacheEventListener, EventDispatcher, EventType};
use crate::loader_writer::CacheLoaderWriter;
use crate::resilience::{ConservativeResilience, ResilienceStrategy};
use crate::store::hashmap::{ShardedHashMapStore, default_shard_count};
use crate::store::traits::ComputeStore;

/// Sizing of the default sharded store.
///
/// | Field              | Type    | Default              | Description                    |
/// |--------------------|---------|----------------------|--------------------------------|
/// | `initial_capacity` | `usize` | 1024                 | Entries preallocated up front  |
/// | `shards`           | `usize` | available CPUs       | Lock stripes in the store      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub initial_capacity: usize,
    pub shards: usize,
}

impl CacheConfig {
    /// Check that the configuration describes a usable store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 {
            return Err(ConfigError::new("shards must be > 0"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            shards: default_shard_count(),
        }
    }
}

/// Builder for [`Cache`] instances.
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    loader_writer: Option<Arc<dyn CacheLoaderWriter<K, V>>>,
    resilience: Arc<dyn ResilienceStrategy<K, V>>,
    listeners: Vec<(Vec<EventType>, Arc<dyn CacheEventListener<K, V>>)>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
{
    /// Create a builder with the default configuration, no loader-writer and
    /// [`ConservativeResilience`].
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            loader_writer: None,
            resilience: Arc::new(ConservativeResilience),
            listeners: Vec::new(),
        }
    }

    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    pub fn shards(mut self, shards: usize) -> Self {
        self.config.shards = shards;
        self
    }

    /// Write every change through to `loader_writer` and load misses from it.
    pub fn loader_writer<L>(mut self, loader_writer: L) -> Self
    where
        L: CacheLoaderWriter<K, V> + 'static,
    {
        self.loader_writer = Some(Arc::new(loader_writer));
        self
    }

    /// Replace the default failure policy.
    pub fn resilience<R>(mut self, strategy: R) -> Self
    where
        R: ResilienceStrategy<K, V> + 'static,
    {
        self.resilience = Arc::new(strategy);
        self
    }

    /// Register a listener for every event kind.
    pub fn listener<L>(self, listener: L) -> Self
    where
        L: CacheEventListener<K, V> + 'static,
    {
        self.listener_for(&EventType::ALL, listener)
    }

    /// Register a listener for the given event kinds.
    pub fn listener_for<L>(mut self, kinds: &[EventType], listener: L) -> Self
    where
        L: CacheEventListener<K, V> + 'static,
    {
        self.listeners.push((kinds.to_vec(), Arc::new(listener)));
        self
    }

    /// Build a cache over the default sharded store, validating the
    /// configuration first.
    pub fn try_build(self) -> Result<Cache<K, V>, ConfigError> {
        self.config.validate()?;
        let store = ShardedHashMapStore::new(self.config.initial_capacity, self.config.shards);
        Ok(self.build_with_store(store))
    }

    /// Build a cache over the default sharded store.
    ///
    /// A shard count of zero is clamped to one; use
    /// [`try_build`](Self::try_build) to reject it instead.
    pub fn build(self) -> Cache<K, V> {
        let store = ShardedHashMapStore::new(self.config.initial_capacity, self.config.shards);
        self.build_with_store(store)
    }

    /// Build a cache over a caller-supplied store. The sizing configuration
    /// is ignored.
    pub fn build_with_store<S>(self, store: S) -> Cache<K, V, S>
    where
        S: ComputeStore<K, V>,
    {
        let events = EventDispatcher::new();
        for (kinds, listener) in self.listeners {
            events.register_for(&kinds, listener);
        }
        Cache::from_coordinator(MutationCoordinator::new(
            store,
            self.loader_writer,
            self.resilience,
            events,
        ))
    }
}

impl<K, V> Default for CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("config", &self.config)
            .field("loader_writer", &self.loader_writer.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
