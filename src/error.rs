//! Error types for the cachekit-facade library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Caller contract violations surfaced by the checked
//!   facade (e.g. an absent key or value).
//! - [`StoreAccessError`]: Returned by a [`ComputeStore`](crate::store::traits::ComputeStore)
//!   when the medium is unavailable or a remapping function aborted.
//!   Never reaches callers of the facade; it is absorbed by the
//!   [`ResilienceStrategy`](crate::resilience::ResilienceStrategy).
//! - [`LoaderWriterError`]: Returned by a
//!   [`CacheLoaderWriter`](crate::loader_writer::CacheLoaderWriter) when the
//!   system of record rejects a load, write or delete.
//! - [`ConfigError`]: Returned when builder parameters are invalid.
//!
//! ## Example Usage
//!
//! ```
//! use cachekit_facade::builder::CacheBuilder;
//! use cachekit_facade::error::CacheError;
//!
//! let cache = CacheBuilder::<String, String>::new().build();
//!
//! // Absent arguments are rejected before the store is touched
//! let err = cache.checked().remove_value(None, Some("v".to_string())).unwrap_err();
//! assert_eq!(err, CacheError::InvalidArgument { name: "key" });
//! ```

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Caller-visible failure of a facade operation.
///
/// Only contract violations are reported this way. Infrastructure faults are
/// converted into degraded results by the resilience strategy instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// A required argument was absent.
    #[error("argument `{name}` must be present")]
    InvalidArgument { name: &'static str },
}

impl CacheError {
    /// Creates an invalid-argument error for the named parameter.
    #[inline]
    pub fn invalid_argument(name: &'static str) -> Self {
        Self::InvalidArgument { name }
    }
}

// ---------------------------------------------------------------------------
// LoaderWriterError
// ---------------------------------------------------------------------------

/// Failure reported by the system of record behind a write-through cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderWriterError {
    #[error("load failed: {0}")]
    Load(String),
    #[error("write failed: {0}")]
    Write(String),
    #[error("delete failed: {0}")]
    Delete(String),
}

// ---------------------------------------------------------------------------
// StoreAccessError
// ---------------------------------------------------------------------------

/// Failure of a store access, including an aborted remapping function.
///
/// When a remapping function aborts, the store retains whatever mapping it
/// held before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreAccessError {
    /// The backing medium could not be reached.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
    /// The remapping function aborted because write-through failed.
    #[error("remapping aborted by loader-writer: {0}")]
    LoaderWriter(#[from] LoaderWriterError),
}

impl StoreAccessError {
    /// Creates an `Unavailable` error with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheConfig::validate`](crate::builder::CacheConfig::validate)
/// and [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
///
/// # Example
///
/// ```
/// use cachekit_facade::builder::CacheBuilder;
///
/// let err = CacheBuilder::<u64, u64>::new().shards(0).try_build().unwrap_err();
/// assert!(err.to_string().contains("shards"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
