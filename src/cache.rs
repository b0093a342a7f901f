//! The cache facade.
//!
//! [`Cache`] exposes the full operation family. Each mutating operation
//! builds a [`Mutation`], hands it to the [`MutationCoordinator`], and
//! interprets the outcome. A store failure is never returned to the caller:
//! it is passed to the [`ResilienceStrategy`](crate::resilience::ResilienceStrategy)
//! whose answer becomes the result, and no event fires.
//!
//! ## Operations
//!
//! | Operation                      | Returns                   | Event on change      |
//! |--------------------------------|---------------------------|----------------------|
//! | `get(&k)`                      | `Option<Arc<V>>`          | `Created` (on load)  |
//! | `contains_key(&k)`             | `bool`                    | -                    |
//! | `put(k, v)`                    | `()`                      | `Created`/`Updated`  |
//! | `put_if_absent(k, v)`          | previous `Option<Arc<V>>` | `Created`            |
//! | `replace(k, v)`                | previous `Option<Arc<V>>` | `Updated`            |
//! | `replace_if_equal(k, old, new)`| `bool`                    | `Updated`            |
//! | `remove(&k)`                   | removed `Option<Arc<V>>`  | `Removed`            |
//! | `remove_value(k, v)`           | `bool`                    | `Removed`            |
//! | `clear()`                      | `()`                      | -                    |
//!
//! Writing a value equal to the current one is written through but is not a
//! change, so it fires nothing.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use cachekit_facade::builder::CacheBuilder;
//! use cachekit_facade::event::{CacheEvent, EventType};
//!
//! let removed = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&removed);
//! let cache = CacheBuilder::<String, String>::new()
//!     .listener_for(&[EventType::Removed], move |event: &CacheEvent<String, String>| {
//!         sink.lock().push(event.key().clone());
//!     })
//!     .build();
//!
//! cache.put("key".to_string(), "value".to_string());
//! assert!(!cache.remove_value("key".to_string(), "other".to_string()));
//! assert!(cache.remove_value("key".to_string(), "value".to_string()));
//! assert!(!cache.remove_value("key".to_string(), "value".to_string()));
//! assert_eq!(*removed.lock(), vec!["key".to_string()]);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::checked::Checked;
use crate::coordinator::MutationCoordinator;
use crate::error::StoreAccessError;
use crate::event::{CacheEventListener, EventType, ListenerId};
use crate::mutation::{Mutation, same_value};
use crate::outcome::MutationOutcome;
use crate::resilience::{Failure, Operation};
use crate::store::hashmap::ShardedHashMapStore;
use crate::store::traits::ComputeStore;

/// In-process cache with atomic conditional mutations, optional
/// write-through and lifecycle events.
///
/// Safe to share across threads (`Arc<Cache<..>>`); operations on different
/// keys do not block each other beyond what the store imposes.
pub struct Cache<K, V, S = ShardedHashMapStore<K, V>> {
    coordinator: MutationCoordinator<K, V, S>,
}

impl<K, V, S> Cache<K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: ComputeStore<K, V>,
{
    pub(crate) fn from_coordinator(coordinator: MutationCoordinator<K, V, S>) -> Self {
        Self { coordinator }
    }

    /// View of this cache that accepts optional arguments and rejects
    /// absent ones with [`CacheError::InvalidArgument`](crate::error::CacheError).
    pub fn checked(&self) -> Checked<'_, K, V, S> {
        Checked::new(self)
    }

    fn failure<'a>(
        operation: Operation,
        key: &'a K,
        cause: &'a StoreAccessError,
    ) -> Failure<'a, K> {
        Failure {
            operation,
            key,
            cause,
        }
    }

    // -- reads -----------------------------------------------------------

    /// Fetch the value for `key`, loading it through the loader-writer on
    /// a miss if one is configured.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.coordinator
            .load_through(key)
            .unwrap_or_else(|cause| {
                self.coordinator
                    .resilience()
                    .get_failure(Self::failure(Operation::Get, key, &cause))
            })
    }

    /// Check if `key` is cached. Never consults the loader-writer.
    pub fn contains_key(&self, key: &K) -> bool {
        self.coordinator
            .store()
            .contains_key(key)
            .unwrap_or_else(|cause| {
                self.coordinator
                    .resilience()
                    .contains_key_failure(Self::failure(Operation::ContainsKey, key, &cause))
            })
    }

    pub fn len(&self) -> usize {
        self.coordinator.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinator.store().is_empty()
    }

    // -- mutations -------------------------------------------------------

    /// Map `key` to `value`, writing through.
    pub fn put(&self, key: K, value: V) {
        let value = Arc::new(value);
        let mutation = Mutation::Put(Arc::clone(&value));
        if let Err(cause) = self.coordinator.mutate(&key, &mutation) {
            self.coordinator
                .resilience()
                .put_failure(Self::failure(Operation::Put, &key, &cause), &value);
        }
    }

    /// Map `key` to `value` unless it is already mapped.
    ///
    /// Returns the existing value if there was one (and nothing changed),
    /// or `None` if `value` was installed.
    pub fn put_if_absent(&self, key: K, value: V) -> Option<Arc<V>> {
        let value = Arc::new(value);
        let mutation = Mutation::PutIfAbsent(Arc::clone(&value));
        match self.coordinator.mutate(&key, &mutation) {
            Ok(applied) => applied.before,
            Err(cause) => self.coordinator.resilience().put_if_absent_failure(
                Self::failure(Operation::PutIfAbsent, &key, &cause),
                &value,
            ),
        }
    }

    /// Replace the value of an already mapped `key`.
    ///
    /// Returns the previous value, or `None` if `key` was absent (and
    /// nothing was installed).
    pub fn replace(&self, key: K, value: V) -> Option<Arc<V>> {
        let value = Arc::new(value);
        let mutation = Mutation::Replace(Arc::clone(&value));
        match self.coordinator.mutate(&key, &mutation) {
            Ok(applied) => applied.before,
            Err(cause) => self.coordinator.resilience().replace_failure(
                Self::failure(Operation::Replace, &key, &cause),
                &value,
            ),
        }
    }

    /// Replace the value of `key` only if it currently equals `expected`.
    ///
    /// Returns `true` if the mapping now holds `replacement`.
    pub fn replace_if_equal(&self, key: K, expected: V, replacement: V) -> bool {
        let expected = Arc::new(expected);
        let replacement = Arc::new(replacement);
        let mutation = Mutation::ReplaceIfEqual {
            expected: Arc::clone(&expected),
            replacement: Arc::clone(&replacement),
        };
        match self.coordinator.mutate(&key, &mutation) {
            // Replacing a value with an equal one is not a change, but the
            // condition held.
            Ok(applied) => applied
                .before
                .is_some_and(|before| same_value(&before, &expected)),
            Err(cause) => self.coordinator.resilience().replace_if_equal_failure(
                Self::failure(Operation::ReplaceIfEqual, &key, &cause),
                &expected,
                &replacement,
            ),
        }
    }

    /// Remove `key`, returning the value it was mapped to.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        match self.coordinator.mutate(key, &Mutation::Remove) {
            Ok(applied) => applied.before,
            Err(cause) => self
                .coordinator
                .resilience()
                .remove_failure(Self::failure(Operation::Remove, key, &cause)),
        }
    }

    /// Remove `key` only if it is currently mapped to `value`.
    ///
    /// Returns `true` if the mapping was removed, in which case exactly one
    /// `Removed` event fired with `value` as the old value. On a store or
    /// write-through failure the resilience strategy decides the result and
    /// no event fires.
    pub fn remove_value(&self, key: K, value: V) -> bool {
        let expected = Arc::new(value);
        let mutation = Mutation::RemoveIfEqual(Arc::clone(&expected));
        match self.coordinator.mutate(&key, &mutation) {
            Ok(applied) => applied.outcome == MutationOutcome::Removed,
            Err(cause) => self.coordinator.resilience().remove_value_failure(
                Self::failure(Operation::RemoveValue, &key, &cause),
                &expected,
            ),
        }
    }

    /// Drop every cached entry. The loader-writer is not consulted and no
    /// events fire.
    pub fn clear(&self) {
        if let Err(cause) = self.coordinator.store().clear() {
            self.coordinator.resilience().clear_failure(&cause);
        }
    }

    // -- listeners -------------------------------------------------------

    /// Register a listener for every event kind.
    pub fn register_listener<L>(&self, listener: L) -> ListenerId
    where
        L: CacheEventListener<K, V> + 'static,
    {
        self.coordinator.events().register(Arc::new(listener))
    }

    /// Register a listener for the given event kinds only.
    pub fn register_listener_for<L>(&self, kinds: &[EventType], listener: L) -> ListenerId
    where
        L: CacheEventListener<K, V> + 'static,
    {
        self.coordinator.events().register_for(kinds, Arc::new(listener))
    }

    pub fn deregister_listener(&self, id: ListenerId) -> bool {
        self.coordinator.events().deregister(id)
    }

    pub fn listener_count(&self) -> usize {
        self.coordinator.events().listener_count()
    }
}

impl<K, V, S: fmt::Debug> fmt::Debug for Cache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}
