//! Storage backends for the cache facade.
//!
//! A store is the sole owner of cache entries. Other components never hold a
//! mutable reference to the mapping; every change goes through
//! [`ComputeStore::compute`], which runs a caller-supplied remapping function
//! inside the store's per-key critical section.

use std::sync::Arc;

use crate::error::{LoaderWriterError, StoreAccessError};

/// Result of a remapping function: the value to install (`None` removes the
/// mapping), or a loader-writer failure that aborts the computation.
pub type Remapped<V> = Result<Option<Arc<V>>, LoaderWriterError>;

/// Atomic per-key read-modify-write store.
///
/// # Contract
///
/// - `compute` serializes all calls for the same key. Calls for different
///   keys may run in parallel.
/// - If the remapping function returns `Err`, the store keeps its previous
///   mapping and reports [`StoreAccessError::LoaderWriter`].
/// - With `replace_equal == false` the store may skip reinstalling a value
///   equal to the current one. This must not be observable.
/// - The remapping function must not call back into the same store.
pub trait ComputeStore<K, V>: Send + Sync {
    /// Fetch a value by key.
    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreAccessError>;

    /// Check if a key is mapped.
    fn contains_key(&self, key: &K) -> Result<bool, StoreAccessError> {
        Ok(self.get(key)?.is_some())
    }

    /// Atomically remap `key` and return the value now installed.
    fn compute<F>(
        &self,
        key: &K,
        remap: F,
        replace_equal: bool,
    ) -> Result<Option<Arc<V>>, StoreAccessError>
    where
        F: FnOnce(Option<&Arc<V>>) -> Remapped<V>;

    /// Current number of entries.
    fn len(&self) -> usize;

    /// Check if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all entries.
    fn clear(&self) -> Result<(), StoreAccessError>;
}

impl<K, V, T> ComputeStore<K, V> for Arc<T>
where
    T: ComputeStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Result<Option<Arc<V>>, StoreAccessError> {
        (**self).get(key)
    }

    fn contains_key(&self, key: &K) -> Result<bool, StoreAccessError> {
        (**self).contains_key(key)
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
        (**self).compute(key, remap, replace_equal)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn clear(&self) -> Result<(), StoreAccessError> {
        (**self).clear()
    }
}
