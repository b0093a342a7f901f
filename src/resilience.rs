//! Translation of store failures into degraded, non-failing results.
//!
//! Every facade operation routes a [`StoreAccessError`] (including one raised
//! by an aborted remapping function) through exactly one method of a
//! [`ResilienceStrategy`]. Whatever that method returns becomes the result of
//! the operation. The coordinator never dispatches an event on this path, so
//! a strategy cannot cause one either.
//!
//! ## Degraded results of [`ConservativeResilience`]
//!
//! | Operation          | Result   | Meaning                          |
//! |--------------------|----------|----------------------------------|
//! | `get`              | `None`   | treated as a miss                |
//! | `contains_key`     | `false`  | treated as absent                |
//! | `put`              | `()`     | the write may not have happened  |
//! | `put_if_absent`    | `None`   | no previous value observed       |
//! | `replace`          | `None`   | nothing replaced                 |
//! | `replace_if_equal` | `false`  | not replaced                     |
//! | `remove`           | `None`   | nothing removed                  |
//! | `remove_value`     | `false`  | not removed                      |
//! | `clear`            | `()`     | the cache may still hold entries |

use std::fmt;
use std::sync::Arc;

use crate::error::StoreAccessError;

/// Cache operation that observed a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    ContainsKey,
    Put,
    PutIfAbsent,
    Replace,
    ReplaceIfEqual,
    Remove,
    RemoveValue,
    Clear,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::ContainsKey => "contains_key",
            Self::Put => "put",
            Self::PutIfAbsent => "put_if_absent",
            Self::Replace => "replace",
            Self::ReplaceIfEqual => "replace_if_equal",
            Self::Remove => "remove",
            Self::RemoveValue => "remove_value",
            Self::Clear => "clear",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The failure a strategy is asked to absorb. Lives for one call.
#[derive(Debug, Clone, Copy)]
pub struct Failure<'a, K> {
    pub operation: Operation,
    pub key: &'a K,
    pub cause: &'a StoreAccessError,
}

/// Policy turning store failures into results for each operation.
///
/// Implementations must not panic: their return value is handed straight to
/// the caller of the cache operation.
pub trait ResilienceStrategy<K, V>: Send + Sync {
    fn get_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>>;

    fn contains_key_failure(&self, failure: Failure<'_, K>) -> bool;

    fn put_failure(&self, failure: Failure<'_, K>, value: &Arc<V>);

    fn put_if_absent_failure(&self, failure: Failure<'_, K>, value: &Arc<V>) -> Option<Arc<V>>;

    fn replace_failure(&self, failure: Failure<'_, K>, value: &Arc<V>) -> Option<Arc<V>>;

    fn replace_if_equal_failure(
        &self,
        failure: Failure<'_, K>,
        expected: &Arc<V>,
        replacement: &Arc<V>,
    ) -> bool;

    fn remove_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>>;

    /// Result of a failed `remove_value(key, expected)`.
    fn remove_value_failure(&self, failure: Failure<'_, K>, expected: &Arc<V>) -> bool;

    fn clear_failure(&self, cause: &StoreAccessError);
}

impl<K, V, T> ResilienceStrategy<K, V> for Arc<T>
where
    T: ResilienceStrategy<K, V> + ?Sized,
{
    fn get_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>> {
        (**self).get_failure(failure)
    }

    fn contains_key_failure(&self, failure: Failure<'_, K>) -> bool {
        (**self).contains_key_failure(failure)
    }

    fn put_failure(&self, failure: Failure<'_, K>, value: &Arc<V>) {
        (**self).put_failure(failure, value)
    }

    fn put_if_absent_failure(&self, failure: Failure<'_, K>, value: &Arc<V>) -> Option<Arc<V>> {
        (**self).put_if_absent_failure(failure, value)
    }

    fn replace_failure(&self, failure: Failure<'_, K>, value: &Arc<V>) -> Option<Arc<V>> {
        (**self).replace_failure(failure, value)
    }

    fn replace_if_equal_failure(
        &self,
        failure: Failure<'_, K>,
        expected: &Arc<V>,
        replacement: &Arc<V>,
    ) -> bool {
        (**self).replace_if_equal_failure(failure, expected, replacement)
    }

    fn remove_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>> {
        (**self).remove_failure(failure)
    }

    fn remove_value_failure(&self, failure: Failure<'_, K>, expected: &Arc<V>) -> bool {
        (**self).remove_value_failure(failure, expected)
    }

    fn clear_failure(&self, cause: &StoreAccessError) {
        (**self).clear_failure(cause)
    }
}

/// Strategy that logs every failure and reports "nothing happened".
#[derive(Debug, Clone, Copy, Default)]
pub struct ConservativeResilience;

impl ConservativeResilience {
    fn log<K>(failure: &Failure<'_, K>) {
        tracing::warn!(
            operation = %failure.operation,
            error = %failure.cause,
            "store access failed, returning degraded result"
        );
    }
}

impl<K, V> ResilienceStrategy<K, V> for ConservativeResilience {
    fn get_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>> {
        Self::log(&failure);
        None
    }

    fn contains_key_failure(&self, failure: Failure<'_, K>) -> bool {
        Self::log(&failure);
        false
    }

    fn put_failure(&self, failure: Failure<'_, K>, _value: &Arc<V>) {
        Self::log(&failure);
    }

    fn put_if_absent_failure(&self, failure: Failure<'_, K>, _value: &Arc<V>) -> Option<Arc<V>> {
        Self::log(&failure);
        None
    }

    fn replace_failure(&self, failure: Failure<'_, K>, _value: &Arc<V>) -> Option<Arc<V>> {
        Self::log(&failure);
        None
    }

    fn replace_if_equal_failure(
        &self,
        failure: Failure<'_, K>,
        _expected: &Arc<V>,
        _replacement: &Arc<V>,
    ) -> bool {
        Self::log(&failure);
        false
    }

    fn remove_failure(&self, failure: Failure<'_, K>) -> Option<Arc<V>> {
        Self::log(&failure);
        None
    }

    fn remove_value_failure(&self, failure: Failure<'_, K>, _expected: &Arc<V>) -> bool {
        Self::log(&failure);
        false
    }

    fn clear_failure(&self, cause: &StoreAccessError) {
        tracing::warn!(
            operation = %Operation::Clear,
            error = %cause,
            "store access failed, returning degraded result"
        );
    }
}
