//! cachekit-facade: atomic conditional mutations, write-through and
//! lifecycle events for in-process caches.
//!
//! See `DESIGN.md` for how the pieces fit together.

pub mod builder;
pub mod cache;
pub mod checked;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod loader_writer;
pub mod mutation;
pub mod outcome;
pub mod prelude;
pub mod resilience;
pub mod store;

pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::Cache;
pub use crate::error::{CacheError, ConfigError, LoaderWriterError, StoreAccessError};
