//! Classification of a single mutation attempt.
//!
//! A [`MutationOutcome`] compares the value a store held before a `compute`
//! with the value it holds afterwards. It is the only input the event
//! dispatcher uses to decide whether anything happened.
//!
//! ```text
//!   before      after       outcome
//!   ─────────   ─────────   ────────
//!   absent      absent      NoOp
//!   v           v           NoOp      (equal values)
//!   absent      v           Added
//!   v           absent      Removed
//!   v           w           Replaced  (v != w)
//! ```

use std::fmt;

/// Before/after transition of one mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOutcome {
    /// Nothing observable changed.
    NoOp,
    /// An absent key gained a value.
    Added,
    /// A present key lost its value.
    Removed,
    /// A present key now maps to a different value.
    Replaced,
}

impl MutationOutcome {
    /// Classifies the transition from `before` to `after`.
    ///
    /// # Example
    ///
    /// ```
    /// use cachekit_facade::outcome::MutationOutcome;
    ///
    /// assert_eq!(MutationOutcome::classify::<u32>(None, None), MutationOutcome::NoOp);
    /// assert_eq!(MutationOutcome::classify(Some(&1), Some(&1)), MutationOutcome::NoOp);
    /// assert_eq!(MutationOutcome::classify(None, Some(&1)), MutationOutcome::Added);
    /// assert_eq!(MutationOutcome::classify(Some(&1), None), MutationOutcome::Removed);
    /// assert_eq!(MutationOutcome::classify(Some(&1), Some(&2)), MutationOutcome::Replaced);
    /// ```
    pub fn classify<V: PartialEq + ?Sized>(before: Option<&V>, after: Option<&V>) -> Self {
        match (before, after) {
            (None, None) => Self::NoOp,
            (None, Some(_)) => Self::Added,
            (Some(_), None) => Self::Removed,
            (Some(old), Some(new)) if old == new => Self::NoOp,
            (Some(_), Some(_)) => Self::Replaced,
        }
    }

    /// Returns `true` if the store's mapping changed.
    #[inline]
    pub fn is_change(self) -> bool {
        self != Self::NoOp
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoOp => "no-op",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Replaced => "replaced",
        };
        f.write_str(label)
    }
}
