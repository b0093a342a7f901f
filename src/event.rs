//! Cache lifecycle events and their synchronous dispatch.
//!
//! ## Architecture
//!
//! ```text
//!   coordinator ── compute committed ──► EventDispatcher::dispatch(outcome, key, old, new)
//!                                               │
//!                                 NoOp ─────────┤──► nothing
//!                                               │
//!                   Added/Replaced/Removed ─────┴──► one CacheEvent
//!                                                       │
//!                                   ┌───────────────────┼───────────────────┐
//!                                   ▼                   ▼                   ▼
//!                              listener #1         listener #2   ...   listener #n
//!                              (registration order, caller's thread)
//! ```
//!
//! Dispatch always runs after the store released the key's critical
//! section, so a listener may call back into the cache.
//!
//! A panicking listener is logged and skipped; the mutation it observed is
//! already committed and the remaining listeners still run.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::outcome::MutationOutcome;

/// Kind of lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Created,
    Updated,
    Removed,
}

impl EventType {
    /// All event kinds, for listeners that want everything.
    pub const ALL: [EventType; 3] = [Self::Created, Self::Updated, Self::Removed];

    /// Maps a committed outcome to the event it produces.
    pub fn for_outcome(outcome: MutationOutcome) -> Option<Self> {
        match outcome {
            MutationOutcome::NoOp => None,
            MutationOutcome::Added => Some(Self::Created),
            MutationOutcome::Replaced => Some(Self::Updated),
            MutationOutcome::Removed => Some(Self::Removed),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "CREATED",
            Self::Updated => "UPDATED",
            Self::Removed => "REMOVED",
        };
        f.pad(label)
    }
}

/// One committed change to a cache entry.
#[derive(Debug)]
pub struct CacheEvent<K, V> {
    kind: EventType,
    key: K,
    old_value: Option<Arc<V>>,
    new_value: Option<Arc<V>>,
}

impl<K, V> CacheEvent<K, V> {
    pub fn kind(&self) -> EventType {
        self.kind
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Value mapped before the change (absent for `Created`).
    pub fn old_value(&self) -> Option<&Arc<V>> {
        self.old_value.as_ref()
    }

    /// Value mapped after the change (absent for `Removed`).
    pub fn new_value(&self) -> Option<&Arc<V>> {
        self.new_value.as_ref()
    }
}

// Manual impl: `derive(Clone)` would require `V: Clone`.
impl<K: Clone, V> Clone for CacheEvent<K, V> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            key: self.key.clone(),
            old_value: self.old_value.clone(),
            new_value: self.new_value.clone(),
        }
    }
}

/// Receiver of cache events.
///
/// Called synchronously on the thread that performed the mutation.
pub trait CacheEventListener<K, V>: Send + Sync {
    fn on_event(&self, event: &CacheEvent<K, V>);
}

impl<K, V, F> CacheEventListener<K, V> for F
where
    F: Fn(&CacheEvent<K, V>) + Send + Sync,
{
    fn on_event(&self, event: &CacheEvent<K, V>) {
        self(event)
    }
}

/// Handle returned by [`EventDispatcher::register`], used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration<K, V> {
    id: ListenerId,
    kinds: Arc<[EventType]>,
    listener: Arc<dyn CacheEventListener<K, V>>,
}

impl<K, V> Clone for Registration<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kinds: Arc::clone(&self.kinds),
            listener: Arc::clone(&self.listener),
        }
    }
}

/// Listener registry and synchronous event fan-out.
///
/// The registry is copy-on-write: registering or deregistering builds a new
/// slice, while dispatch only clones the `Arc` of the current one.
pub struct EventDispatcher<K, V> {
    registrations: RwLock<Arc<[Registration<K, V>]>>,
    next_id: AtomicU64,
}

impl<K, V> EventDispatcher<K, V> {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(Arc::from(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener for every event kind.
    pub fn register(&self, listener: Arc<dyn CacheEventListener<K, V>>) -> ListenerId {
        self.register_for(&EventType::ALL, listener)
    }

    /// Register a listener that only receives the given event kinds.
    pub fn register_for(
        &self,
        kinds: &[EventType],
        listener: Arc<dyn CacheEventListener<K, V>>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registrations = self.registrations.write();
        let mut next = Vec::with_capacity(registrations.len() + 1);
        next.extend(registrations.iter().cloned());
        next.push(Registration {
            id,
            kinds: kinds.into(),
            listener,
        });
        *registrations = next.into();
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn deregister(&self, id: ListenerId) -> bool {
        let mut registrations = self.registrations.write();
        if !registrations.iter().any(|registration| registration.id == id) {
            return false;
        }
        let next: Arc<[Registration<K, V>]> = registrations
            .iter()
            .filter(|registration| registration.id != id)
            .cloned()
            .collect();
        *registrations = next;
        true
    }

    fn snapshot(&self) -> Arc<[Registration<K, V>]> {
        Arc::clone(&self.registrations.read())
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Deliver the event for a committed outcome.
    ///
    /// Returns `true` if an event was produced (even if no listener wanted
    /// it). Fires nothing for [`MutationOutcome::NoOp`].
    pub fn dispatch(
        &self,
        outcome: MutationOutcome,
        key: K,
        old_value: Option<Arc<V>>,
        new_value: Option<Arc<V>>,
    ) -> bool {
        let Some(kind) = EventType::for_outcome(outcome) else {
            return false;
        };

        let event = CacheEvent {
            kind,
            key,
            old_value,
            new_value,
        };

        // Listeners may (de)register; they see the next snapshot.
        let registrations = self.snapshot();
        for registration in registrations
            .iter()
            .filter(|registration| registration.kinds.contains(&kind))
        {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                registration.listener.on_event(&event)
            }));
            if delivered.is_err() {
                tracing::error!(
                    listener = registration.id.0,
                    event = %kind,
                    "cache event listener panicked"
                );
            }
        }
        true
    }
}

impl<K, V> Default for EventDispatcher<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for EventDispatcher<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
