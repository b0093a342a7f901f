//! Argument-checking view over a [`Cache`].
//!
//! Callers that relay optional input (decoded requests, FFI, scripting
//! bindings) can hand their `Option`s straight to [`Checked`]. An absent key
//! or value fails with [`CacheError::InvalidArgument`] before the store, the
//! loader-writer or any listener is touched. Present arguments run the
//! regular typed operation.

use std::hash::Hash;
use std::sync::Arc;

use crate::cache::Cache;
use crate::error::CacheError;
use crate::store::traits::ComputeStore;

/// Borrowed view of a cache whose operations validate their arguments.
#[derive(Debug)]
pub struct Checked<'a, K, V, S> {
    cache: &'a Cache<K, V, S>,
}

fn require<T>(arg: Option<T>, name: &'static str) -> Result<T, CacheError> {
    arg.ok_or_else(|| CacheError::invalid_argument(name))
}

impl<'a, K, V, S> Checked<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: PartialEq,
    S: ComputeStore<K, V>,
{
    pub(crate) fn new(cache: &'a Cache<K, V, S>) -> Self {
        Self { cache }
    }

    pub fn get(&self, key: Option<&K>) -> Result<Option<Arc<V>>, CacheError> {
        let key = require(key, "key")?;
        Ok(self.cache.get(key))
    }

    pub fn contains_key(&self, key: Option<&K>) -> Result<bool, CacheError> {
        let key = require(key, "key")?;
        Ok(self.cache.contains_key(key))
    }

    pub fn put(&self, key: Option<K>, value: Option<V>) -> Result<(), CacheError> {
        let key = require(key, "key")?;
        let value = require(value, "value")?;
        self.cache.put(key, value);
        Ok(())
    }

    pub fn put_if_absent(
        &self,
        key: Option<K>,
        value: Option<V>,
    ) -> Result<Option<Arc<V>>, CacheError> {
        let key = require(key, "key")?;
        let value = require(value, "value")?;
        Ok(self.cache.put_if_absent(key, value))
    }

    pub fn replace(&self, key: Option<K>, value: Option<V>) -> Result<Option<Arc<V>>, CacheError> {
        let key = require(key, "key")?;
        let value = require(value, "value")?;
        Ok(self.cache.replace(key, value))
    }

    pub fn replace_if_equal(
        &self,
        key: Option<K>,
        expected: Option<V>,
        replacement: Option<V>,
    ) -> Result<bool, CacheError> {
        let key = require(key, "key")?;
        let expected = require(expected, "expected")?;
        let replacement = require(replacement, "replacement")?;
        Ok(self.cache.replace_if_equal(key, expected, replacement))
    }

    pub fn remove(&self, key: Option<&K>) -> Result<Option<Arc<V>>, CacheError> {
        let key = require(key, "key")?;
        Ok(self.cache.remove(key))
    }

    /// Conditional removal; see [`Cache::remove_value`].
    pub fn remove_value(&self, key: Option<K>, value: Option<V>) -> Result<bool, CacheError> {
        let key = require(key, "key")?;
        let value = require(value, "value")?;
        Ok(self.cache.remove_value(key, value))
    }
}
