pub use crate::builder::{CacheBuilder, CacheConfig};
pub use crate::cache::Cache;
pub use crate::checked::Checked;
pub use crate::error::{CacheError, ConfigError, LoaderWriterError, StoreAccessError};
pub use crate::event::{CacheEvent, CacheEventListener, EventType, ListenerId};
pub use crate::loader_writer::CacheLoaderWriter;
pub use crate::outcome::MutationOutcome;
pub use crate::resilience::{ConservativeResilience, Failure, Operation, ResilienceStrategy};
pub use crate::store::traits::ComputeStore;
pub use crate::store::{ConcurrentHashMapStore, ShardedHashMapStore};
