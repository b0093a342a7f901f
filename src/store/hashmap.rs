//! HashMap-backed compute stores.
//!
//! ## Architecture
//! - Values are stored as `Arc<V>` so the coordinator can hand the same
//!   allocation to callers and listeners.
//! - Every mapped key owns a slot holding its value and a key lock. `compute`
//!   runs the remapping function (and so any write-through) under the key
//!   lock only; the map lock is taken briefly to find the slot and again to
//!   install the result.
//! - A slow remap therefore delays other operations on the same key but
//!   never operations on other keys, whichever shard they hash to.
//! - Neither store enforces a capacity. Eviction is not their concern.
//!
//! ```text
//!   compute(k, remap)
//!     map.read/write ──► slot(k).lock (created vacant if absent)
//!     key lock held ───► map.read: slot still current? else retry
//!                        remap(current)          (no map lock held)
//!                        map.write: install / drop vacant slot
//!     key lock released
//! ```
//!
//! ## Key Components
//! - `ConcurrentHashMapStore`: a single map with per-key locks.
//! - `ShardedHashMapStore`: the same slots spread over lock-striped maps, so
//!   the short install sections of unrelated keys rarely meet.
//!
//! ## Example Usage
//! ```rust
//! use std::sync::Arc;
//!
//! use cachekit_facade::store::hashmap::ShardedHashMapStore;
//! use cachekit_facade::store::traits::ComputeStore;
//!
//! let store: ShardedHashMapStore<u64, String> = ShardedHashMapStore::new(16, 4);
//! let installed = store
//!     .compute(&1, |_| Ok(Some(Arc::new("a".to_string()))), false)
//!     .unwrap();
//! assert_eq!(installed.as_deref().map(String::as_str), Some("a"));
//! assert!(store.contains_key(&1).unwrap());
//! ```
//!
//! ## Type Constraints
//! - `K: Eq + Hash + Clone` (the key is cloned when a slot is created).
//! - `V: PartialEq` so `replace_equal == false` can skip redundant writes.
//! - `S: BuildHasher` picks the shard (defaults to `RandomState`).
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::error::StoreAccessError;
use crate::mutation::same_value;
use crate::store::traits::{ComputeStore, Remapped};

/// Mapping of one key: its value (`None` while a first compute is running)
/// and the lock serializing computes on that key.
#[derive(Debug)]
struct Slot<V> {
    lock: Arc<Mutex<()>>,
    value: Option<Arc<V>>,
}

impl<V> Slot<V> {
    fn vacant() -> Self {
        Self {
            lock: Arc::default(),
            value: None,
        }
    }
}

/// One map of slots. Both stores are built from these.
///
/// A slot is only removed by the holder of its key lock (when it ends up
/// vacant) or by `clear` when nobody else references the lock. A compute
/// that waited on a removed slot's lock notices and retries on a fresh one.
#[derive(Debug)]
struct Shard<K, V> {
    map: RwLock<FxHashMap<K, Slot<V>>>,
}

impl<K, V> Shard<K, V>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
{
    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.read().get(key).and_then(|slot| slot.value.clone())
    }

    fn contains_key(&self, key: &K) -> bool {
        self.map
            .read()
            .get(key)
            .is_some_and(|slot| slot.value.is_some())
    }

    /// Lock of the slot for `key`, creating a vacant slot if there is none.
    fn key_lock(&self, key: &K) -> Arc<Mutex<()>> {
        if let Some(slot) = self.map.read().get(key) {
            return Arc::clone(&slot.lock);
        }
        let mut map = self.map.write();
        let slot = map.entry(key.clone()).or_insert_with(Slot::vacant);
        Arc::clone(&slot.lock)
    }

    /// Read-remap-install for `key`. Returns the installed value and the
    /// change in mapped-value count.
    fn compute<F>(
        &self,
        key: &K,
        remap: F,
        replace_equal: bool,
    ) -> Result<(Option<Arc<V>>, isize), StoreAccessError>
    where
        F: FnOnce(Option<&Arc<V>>) -> Remapped<V>,
    {
        loop {
            let lock = self.key_lock(key);
            let _held = lock.lock();

            let current = match self.map.read().get(key) {
                Some(slot) if Arc::ptr_eq(&slot.lock, &lock) => slot.value.clone(),
                // Slot was dropped while we waited for its lock.
                _ => continue,
            };

            return match remap(current.as_ref()) {
                Ok(remapped) => Ok(self.install(key, &lock, remapped, replace_equal)),
                Err(error) => {
                    self.drop_if_vacant(key, &lock);
                    Err(error.into())
                },
            };
        }
    }

    /// Commit a remapped value. Caller holds the key lock.
    fn install(
        &self,
        key: &K,
        lock: &Arc<Mutex<()>>,
        remapped: Option<Arc<V>>,
        replace_equal: bool,
    ) -> (Option<Arc<V>>, isize) {
        let mut map = self.map.write();
        let Some(slot) = map.get_mut(key) else {
            // Only reachable if the slot vanished despite our lock reference.
            let delta = isize::from(remapped.is_some());
            if let Some(value) = &remapped {
                map.insert(
                    key.clone(),
                    Slot {
                        lock: Arc::clone(lock),
                        value: Some(Arc::clone(value)),
                    },
                );
            }
            return (remapped, delta);
        };

        let was_mapped = slot.value.is_some();
        let unchanged = match (&slot.value, &remapped) {
            (Some(old), Some(new)) => !replace_equal && same_value(old, new),
            _ => false,
        };
        if !unchanged {
            slot.value = remapped;
        }
        let installed = slot.value.clone();
        let delta = isize::from(installed.is_some()) - isize::from(was_mapped);

        if installed.is_none() {
            map.remove(key);
        }
        (installed, delta)
    }

    /// Drop a slot that an aborted first compute left behind.
    fn drop_if_vacant(&self, key: &K, lock: &Arc<Mutex<()>>) {
        let mut map = self.map.write();
        let vacant = map
            .get(key)
            .is_some_and(|slot| slot.value.is_none() && Arc::ptr_eq(&slot.lock, lock));
        if vacant {
            map.remove(key);
        }
    }

    /// Unmap every key. Returns how many values were dropped.
    ///
    /// Slots whose lock is held or awaited stay behind, vacant, so their
    /// computes finish against the slot they locked.
    fn clear(&self) -> usize {
        let mut dropped = 0;
        self.map.write().retain(|_, slot| {
            if slot.value.take().is_some() {
                dropped += 1;
            }
            Arc::strong_count(&slot.lock) > 1
        });
        dropped
    }
}

fn apply_delta(size: &AtomicUsize, delta: isize) {
    match delta {
        1 => {
            size.fetch_add(1, Ordering::Relaxed);
        },
        -1 => {
            size.fetch_sub(1, Ordering::Relaxed);
        },
        _ => {},
    }
}

/// Concurrent HashMap-backed store with per-key locking over one map.
#[derive(Debug)]
pub struct ConcurrentHashMapStore<K, V> {
    shard: Shard<K, V>,
    size: AtomicUsize,
}

impl<K, V> ConcurrentHashMapStore<K, V>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
{
    /// Create a store preallocated for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            shard: Shard::with_capacity(capacity),
            size: AtomicUsize::new(0),
        }
    }
}

impl<K, V> Default for ConcurrentHashMapStore<K, V>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
{
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K, V> ComputeStore<K, V> for ConcurrentHashMapStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
{
    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreAccessError> {
        Ok(self.shard.get(key))
    }

    fn contains_key(&self, key: &K) -> Result<bool, StoreAccessError> {
        Ok(self.shard.contains_key(key))
    }

    fn compute<F>(
        &self,
        key: &K,
        remap: F,
        replace_equal: bool,
    ) -> Result<Option<Arc<V>>, StoreAccessError>
    where
        F: FnOnce(Option<&Arc<V>>) -> Remapped<V>,
    {
        let (installed, delta) = self.shard.compute(key, remap, replace_equal)?;
        apply_delta(&self.size, delta);
        Ok(installed)
    }

    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    fn clear(&self) -> Result<(), StoreAccessError> {
        let dropped = self.shard.clear();
        self.size.fetch_sub(dropped, Ordering::Relaxed);
        Ok(())
    }
}

/// Concurrent HashMap-backed store with sharded maps and per-key locking.
#[derive(Debug)]
pub struct ShardedHashMapStore<K, V, S = RandomState> {
    shards: Vec<Shard<K, V>>,
    size: AtomicUsize,
    hasher: S,
}

impl<K, V> ShardedHashMapStore<K, V, RandomState>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
{
    /// Create a sharded store with the default hasher.
    pub fn new(capacity: usize, shards: usize) -> Self {
        Self::with_hasher(capacity, shards, RandomState::new())
    }

    /// Create a store with one shard per available CPU.
    pub fn with_default_shards(capacity: usize) -> Self {
        Self::new(capacity, default_shard_count())
    }
}

impl<K, V, S> ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: BuildHasher,
{
    /// Create a sharded store with a custom shard-selection hasher.
    ///
    /// `capacity` is spread evenly over the shards as preallocation.
    /// A shard count of zero is clamped to one.
    pub fn with_hasher(capacity: usize, shards: usize, hasher: S) -> Self {
        let shard_count = shards.max(1);
        let per_shard = capacity.div_ceil(shard_count);
        let shards = (0..shard_count)
            .map(|_| Shard::with_capacity(per_shard))
            .collect();
        Self {
            shards,
            size: AtomicUsize::new(0),
            hasher,
        }
    }

    /// Return the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &Shard<K, V> {
        let idx = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[idx]
    }
}

impl<K, V, S> ComputeStore<K, V> for ShardedHashMapStore<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreAccessError> {
        Ok(self.shard(key).get(key))
    }

    fn contains_key(&self, key: &K) -> Result<bool, StoreAccessError> {
        Ok(self.shard(key).contains_key(key))
    }

    fn compute<F>(
        &self,
        key: &K,
        remap: F,
        replace_equal: bool,
    ) -> Result<Option<Arc<V>>, StoreAccessError>
    where
        F: FnOnce(Option<&Arc<V>>) -> Remapped<V>,
    {
        let (installed, delta) = self.shard(key).compute(key, remap, replace_equal)?;
        apply_delta(&self.size, delta);
        Ok(installed)
    }

    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    fn clear(&self) -> Result<(), StoreAccessError> {
        for shard in &self.shards {
            let dropped = shard.clear();
            self.size.fetch_sub(dropped, Ordering::Relaxed);
        }
        Ok(())
    }
}

/// One shard per available CPU, or one if that cannot be determined.
pub(crate) fn default_shard_count() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}
