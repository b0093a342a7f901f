//! The mutation skeleton shared by every cache operation.
//!
//! ## Architecture
//!
//! ```text
//!   Cache::remove_value(k, v)
//!        │
//!        ▼
//!   MutationCoordinator::mutate(&k, RemoveIfEqual(v))
//!        │
//!        ▼
//!   store.compute(&k, remap, replace_equal = false) ──────────────┐
//!        │        │                                               │ per-key
//!        │        └─ remap(current)                               │ critical
//!        │              transition = mutation.transition(current) │ section
//!        │              Install(v) → loader_writer.write(k, v)?   │
//!        │              Delete     → loader_writer.delete(k)?     │
//!        │              Keep       → current                      │
//!        │                                                ────────┘
//!        ├── Ok(after)  → outcome = classify(before, after)
//!        │                events.dispatch(outcome, ..)   (0 or 1 event)
//!        │                Ok(Applied { before, after, outcome })
//!        │
//!        └── Err(cause) → Err(cause)   (no event; the facade hands it to
//!                                       the resilience strategy)
//! ```
//!
//! A loader-writer error is returned from the remapping function as a
//! value. The store sees the `Err`, keeps the previous mapping, and reports
//! it as [`StoreAccessError::LoaderWriter`]; from then on it is handled like
//! any other store failure.

use std::fmt;
use std::sync::Arc;

use crate::error::StoreAccessError;
use crate::event::EventDispatcher;
use crate::loader_writer::CacheLoaderWriter;
use crate::mutation::{Mutation, Transition};
use crate::outcome::MutationOutcome;
use crate::resilience::ResilienceStrategy;
use crate::store::traits::ComputeStore;

/// Result of a committed `compute`.
#[derive(Debug)]
pub struct Applied<V> {
    /// Value mapped when the remapping function ran.
    pub before: Option<Arc<V>>,
    /// Value mapped after the store committed.
    pub after: Option<Arc<V>>,
    pub outcome: MutationOutcome,
}

/// Drives store, write-through and event dispatch for one cache.
///
/// Owns no lock of its own. The only serialization point is the store's
/// per-key critical section.
pub struct MutationCoordinator<K, V, S> {
    store: S,
    loader_writer: Option<Arc<dyn CacheLoaderWriter<K, V>>>,
    resilience: Arc<dyn ResilienceStrategy<K, V>>,
    events: EventDispatcher<K, V>,
}

impl<K, V, S> MutationCoordinator<K, V, S>
where
    K: Clone,
    V: PartialEq,
    S: ComputeStore<K, V>,
{
    pub fn new(
        store: S,
        loader_writer: Option<Arc<dyn CacheLoaderWriter<K, V>>>,
        resilience: Arc<dyn ResilienceStrategy<K, V>>,
        events: EventDispatcher<K, V>,
    ) -> Self {
        Self {
            store,
            loader_writer,
            resilience,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &EventDispatcher<K, V> {
        &self.events
    }

    pub fn resilience(&self) -> &dyn ResilienceStrategy<K, V> {
        self.resilience.as_ref()
    }

    pub fn has_loader_writer(&self) -> bool {
        self.loader_writer.is_some()
    }

    /// Apply `mutation` to `key` atomically, writing through and firing at
    /// most one event.
    ///
    /// The store is told `replace_equal = false`: when the transition keeps
    /// the current value, nothing is rewritten.
    pub fn mutate(
        &self,
        key: &K,
        mutation: &Mutation<V>,
    ) -> Result<Applied<V>, StoreAccessError> {
        let loader_writer = self.loader_writer.as_deref();
        let mut before = None;

        let after = self.store.compute(
            key,
            |current| {
                before = current.cloned();
                match mutation.transition(current) {
                    Transition::Keep => Ok(current.cloned()),
                    Transition::Install(value) => {
                        if let Some(writer) = loader_writer {
                            writer.write(key, &value).inspect_err(|error| {
                                tracing::debug!(
                                    operation = mutation.name(),
                                    %error,
                                    "write-through failed, keeping cached mapping"
                                );
                            })?;
                        }
                        Ok(Some(value))
                    },
                    Transition::Delete => {
                        if let Some(writer) = loader_writer {
                            writer.delete(key).inspect_err(|error| {
                                tracing::debug!(
                                    operation = mutation.name(),
                                    %error,
                                    "write-through delete failed, keeping cached mapping"
                                );
                            })?;
                        }
                        Ok(None)
                    },
                }
            },
            false,
        )?;

        let outcome = MutationOutcome::classify(before.as_deref(), after.as_deref());
        tracing::trace!(operation = mutation.name(), %outcome, "mutation committed");
        Ok(self.commit(key, before, after, outcome))
    }

    /// Read `key`, loading it through the loader-writer on a miss.
    ///
    /// A loaded value is installed atomically and reported as `Added`.
    /// Without a loader-writer this is a plain store read.
    pub fn load_through(&self, key: &K) -> Result<Option<Arc<V>>, StoreAccessError> {
        if let Some(hit) = self.store.get(key)? {
            return Ok(Some(hit));
        }
        let Some(loader) = self.loader_writer.as_deref() else {
            return Ok(None);
        };

        let mut before = None;
        let after = self.store.compute(
            key,
            |current| {
                before = current.cloned();
                match current {
                    Some(value) => Ok(Some(Arc::clone(value))),
                    None => Ok(loader.load(key)?.map(Arc::new)),
                }
            },
            false,
        )?;

        let outcome = MutationOutcome::classify(before.as_deref(), after.as_deref());
        let applied = self.commit(key, before, after, outcome);
        Ok(applied.after)
    }

    /// Fire the event for a committed outcome and package the result.
    fn commit(
        &self,
        key: &K,
        before: Option<Arc<V>>,
        after: Option<Arc<V>>,
        outcome: MutationOutcome,
    ) -> Applied<V> {
        if outcome.is_change() {
            self.events
                .dispatch(outcome, key.clone(), before.clone(), after.clone());
        }
        Applied {
            before,
            after,
            outcome,
        }
    }
}

impl<K, V, S: fmt::Debug> fmt::Debug for MutationCoordinator<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("store", &self.store)
            .field("loader_writer", &self.loader_writer.is_some())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::error::LoaderWriterError;
    use crate::event::{CacheEvent, EventType};
    use crate::resilience::ConservativeResilience;
    use crate::store::hashmap::ConcurrentHashMapStore;

    #[derive(Default)]
    struct Backing {
        fail_deletes: bool,
        calls: Mutex<Vec<String>>,
    }

    impl CacheLoaderWriter<&'static str, String> for Backing {
        fn load(&self, key: &&'static str) -> Result<Option<String>, LoaderWriterError> {
            self.calls.lock().push(format!("load {key}"));
            Ok(Some(format!("loaded-{key}")))
        }

        fn write(&self, key: &&'static str, value: &String) -> Result<(), LoaderWriterError> {
            self.calls.lock().push(format!("write {key}={value}"));
            Ok(())
        }

        fn delete(&self, key: &&'static str) -> Result<(), LoaderWriterError> {
            if self.fail_deletes {
                return Err(LoaderWriterError::Delete("backend down".into()));
            }
            self.calls.lock().push(format!("delete {key}"));
            Ok(())
        }
    }

    type Coordinator = MutationCoordinator<&'static str, String, ConcurrentHashMapStore<&'static str, String>>;

    fn coordinator(backing: Option<Arc<Backing>>) -> (Coordinator, Arc<Mutex<Vec<EventType>>>) {
        let events = EventDispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.register(Arc::new(move |event: &CacheEvent<&'static str, String>| {
            sink.lock().push(event.kind())
        }));
        let loader_writer = backing.map(|b| b as Arc<dyn CacheLoaderWriter<&'static str, String>>);
        let coordinator = MutationCoordinator::new(
            ConcurrentHashMapStore::new(8),
            loader_writer,
            Arc::new(ConservativeResilience),
            events,
        );
        (coordinator, seen)
    }

    fn value(v: &str) -> Arc<String> {
        Arc::new(v.to_string())
    }

    #[test]
    fn put_then_remove_reports_outcomes() {
        let (coordinator, seen) = coordinator(None);

        let applied = coordinator.mutate(&"k", &Mutation::Put(value("v"))).unwrap();
        assert_eq!(applied.outcome, MutationOutcome::Added);
        assert_eq!(applied.before, None);

        let applied = coordinator
            .mutate(&"k", &Mutation::RemoveIfEqual(value("v")))
            .unwrap();
        assert_eq!(applied.outcome, MutationOutcome::Removed);
        assert_eq!(applied.before, Some(value("v")));
        assert_eq!(applied.after, None);

        assert_eq!(*seen.lock(), vec![EventType::Created, EventType::Removed]);
    }

    #[test]
    fn keep_transition_is_noop_without_event() {
        let (coordinator, seen) = coordinator(None);
        coordinator.mutate(&"k", &Mutation::Put(value("v"))).unwrap();

        let applied = coordinator
            .mutate(&"k", &Mutation::RemoveIfEqual(value("other")))
            .unwrap();
        assert_eq!(applied.outcome, MutationOutcome::NoOp);
        assert_eq!(applied.after, Some(value("v")));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn write_through_happens_for_install_and_delete_only() {
        let backing = Arc::new(Backing::default());
        let (coordinator, _) = coordinator(Some(Arc::clone(&backing)));

        coordinator.mutate(&"k", &Mutation::Put(value("v"))).unwrap();
        coordinator
            .mutate(&"k", &Mutation::PutIfAbsent(value("w")))
            .unwrap();
        coordinator
            .mutate(&"k", &Mutation::RemoveIfEqual(value("v")))
            .unwrap();

        assert_eq!(*backing.calls.lock(), vec!["write k=v", "delete k"]);
    }

    #[test]
    fn failed_delete_aborts_and_keeps_entry() {
        let backing = Arc::new(Backing {
            fail_deletes: true,
            ..Backing::default()
        });
        let (coordinator, seen) = coordinator(Some(backing));
        coordinator.mutate(&"k", &Mutation::Put(value("v"))).unwrap();

        let err = coordinator
            .mutate(&"k", &Mutation::RemoveIfEqual(value("v")))
            .unwrap_err();
        assert!(matches!(err, StoreAccessError::LoaderWriter(LoaderWriterError::Delete(_))));
        assert_eq!(coordinator.store().get(&"k").unwrap(), Some(value("v")));
        assert_eq!(*seen.lock(), vec![EventType::Created]);
    }

    #[test]
    fn load_through_installs_and_fires_created_once() {
        let backing = Arc::new(Backing::default());
        let (coordinator, seen) = coordinator(Some(Arc::clone(&backing)));

        assert_eq!(coordinator.load_through(&"k").unwrap(), Some(value("loaded-k")));
        assert_eq!(coordinator.load_through(&"k").unwrap(), Some(value("loaded-k")));

        assert_eq!(*backing.calls.lock(), vec!["load k"]);
        assert_eq!(*seen.lock(), vec![EventType::Created]);
    }

    #[test]
    fn load_through_without_loader_is_a_read() {
        let (coordinator, seen) = coordinator(None);
        assert!(!coordinator.has_loader_writer());
        assert_eq!(coordinator.load_through(&"k").unwrap(), None);
        assert!(coordinator.store().is_empty());
        assert!(seen.lock().is_empty());
    }
}
