//! Transition table shared by every mutating cache operation.
//!
//! Each operation of the facade is a [`Mutation`]. Given the value a store
//! currently maps (possibly absent), [`Mutation::transition`] decides what
//! to install. The coordinator turns that decision into a remapping function
//! and write-through calls; nothing else differs between operations.
//!
//! ```text
//!   mutation                 current absent     current == arg     current other
//!   ──────────────────────   ────────────────   ────────────────   ─────────────
//!   Put(v)                   Install(v)         Install(v)         Install(v)
//!   PutIfAbsent(v)           Install(v)         Keep               Keep
//!   Replace(v)               Keep               Install(v)         Install(v)
//!   ReplaceIfEqual(o, n)     Keep               Install(n)         Keep
//!   Remove                   Keep               Delete             Delete
//!   RemoveIfEqual(v)         Keep               Delete             Keep
//! ```

use std::sync::Arc;

/// What a remapping function should do with the current mapping.
#[derive(Debug, PartialEq)]
pub enum Transition<V> {
    /// Leave the mapping as it is.
    Keep,
    /// Map the key to the given value (write-through `write`).
    Install(Arc<V>),
    /// Drop the mapping (write-through `delete`).
    Delete,
}

// Manual impl: `derive(Clone)` would require `V: Clone`.
impl<V> Clone for Transition<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Keep => Self::Keep,
            Self::Install(value) => Self::Install(Arc::clone(value)),
            Self::Delete => Self::Delete,
        }
    }
}

/// A mutating cache operation together with its arguments.
#[derive(Debug, PartialEq)]
pub enum Mutation<V> {
    Put(Arc<V>),
    PutIfAbsent(Arc<V>),
    Replace(Arc<V>),
    ReplaceIfEqual { expected: Arc<V>, replacement: Arc<V> },
    Remove,
    RemoveIfEqual(Arc<V>),
}

impl<V: PartialEq> Mutation<V> {
    /// Decides the transition for the given current value.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use cachekit_facade::mutation::{Mutation, Transition};
    ///
    /// let remove = Mutation::RemoveIfEqual(Arc::new("v"));
    /// assert_eq!(remove.transition(None), Transition::Keep);
    /// assert_eq!(remove.transition(Some(&Arc::new("other"))), Transition::Keep);
    /// assert_eq!(remove.transition(Some(&Arc::new("v"))), Transition::Delete);
    /// ```
    pub fn transition(&self, current: Option<&Arc<V>>) -> Transition<V> {
        match (self, current) {
            (Self::Put(value), _) => Transition::Install(Arc::clone(value)),
            (Self::PutIfAbsent(value), None) => Transition::Install(Arc::clone(value)),
            (Self::PutIfAbsent(_), Some(_)) => Transition::Keep,
            (Self::Replace(_), None) => Transition::Keep,
            (Self::Replace(value), Some(_)) => Transition::Install(Arc::clone(value)),
            (
                Self::ReplaceIfEqual {
                    expected,
                    replacement,
                },
                Some(current),
            ) if same_value(current, expected) => Transition::Install(Arc::clone(replacement)),
            (Self::ReplaceIfEqual { .. }, _) => Transition::Keep,
            (Self::Remove, Some(_)) => Transition::Delete,
            (Self::Remove, None) => Transition::Keep,
            (Self::RemoveIfEqual(expected), Some(current)) if same_value(current, expected) => {
                Transition::Delete
            },
            (Self::RemoveIfEqual(_), _) => Transition::Keep,
        }
    }
}

impl<V> Mutation<V> {
    /// Short operation name used in logs and failure records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Put(_) => "put",
            Self::PutIfAbsent(_) => "put_if_absent",
            Self::Replace(_) => "replace",
            Self::ReplaceIfEqual { .. } => "replace_if_equal",
            Self::Remove => "remove",
            Self::RemoveIfEqual(_) => "remove_value",
        }
    }
}

/// Value equality with a pointer fast path.
#[inline]
pub(crate) fn same_value<V: PartialEq>(a: &Arc<V>, b: &Arc<V>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
