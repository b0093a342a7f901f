// ==============================================
// CONDITIONAL REMOVAL: RESULTS AND EVENTS
// ==============================================
//
// `remove_value(k, v)` against every starting state of the store, checking
// the returned flag, the remaining mapping and the exact events delivered.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cachekit_facade::builder::CacheBuilder;
use cachekit_facade::cache::Cache;
use cachekit_facade::error::{CacheError, StoreAccessError};
use cachekit_facade::event::EventType;
use cachekit_facade::resilience::{Failure, Operation, ResilienceStrategy};
use common::{EventLog, FlakyStore, Seen, s};

type Observed = (Cache<String, String, Arc<FlakyStore>>, Arc<FlakyStore>, EventLog);

fn cache_over(store: FlakyStore) -> Observed {
    let store = Arc::new(store);
    let log = EventLog::default();
    let cache = CacheBuilder::new()
        .listener(log.clone())
        .build_with_store(Arc::clone(&store));
    (cache, store, log)
}

// ----------------------------------------------
// Argument validation
// ----------------------------------------------

#[test]
fn absent_key_is_rejected_without_events() {
    let (cache, store, log) = cache_over(FlakyStore::with_entries(&[("key", "value")]));
    let result = cache.checked().remove_value(None, Some(s("value")));
    assert_eq!(result, Err(CacheError::InvalidArgument { name: "key" }));
    assert_eq!(log.count(), 0);
    assert_eq!(store.computes(), 0);
}

#[test]
fn absent_value_is_rejected_without_events() {
    let (cache, store, log) = cache_over(FlakyStore::with_entries(&[("key", "value")]));
    let result = cache.checked().remove_value(Some(s("key")), None);
    assert_eq!(result, Err(CacheError::InvalidArgument { name: "value" }));
    assert_eq!(store.peek("key"), Some(s("value")));
    assert_eq!(log.count(), 0);
}

#[test]
fn absent_key_and_value_are_rejected() {
    let (cache, _, log) = cache_over(FlakyStore::new());
    assert!(cache.checked().remove_value(None, None).is_err());
    assert_eq!(log.count(), 0);
}

// ----------------------------------------------
// Store states
// ----------------------------------------------

#[test]
fn empty_store_returns_false_without_events() {
    let (cache, store, log) = cache_over(FlakyStore::new());
    assert!(!cache.remove_value(s("key"), s("value")));
    assert_eq!(store.peek("key"), None);
    assert_eq!(log.count(), 0);
}

#[test]
fn equal_value_is_removed_with_one_event() {
    let (cache, store, log) = cache_over(FlakyStore::with_entries(&[("key", "value")]));
    assert!(cache.remove_value(s("key"), s("value")));
    assert_eq!(store.peek("key"), None);
    assert_eq!(log.events(), vec![Seen::removed("key", "value")]);
}

#[test]
fn unequal_value_is_kept_without_events() {
    let (cache, store, log) = cache_over(FlakyStore::with_entries(&[("key", "oldValue")]));
    assert!(!cache.remove_value(s("key"), s("value")));
    assert_eq!(store.peek("key"), Some(s("oldValue")));
    assert_eq!(log.count(), 0);
}

#[test]
fn other_keys_are_untouched() {
    let (cache, store, log) =
        cache_over(FlakyStore::with_entries(&[("key", "value"), ("other", "value")]));
    assert!(cache.remove_value(s("key"), s("value")));
    assert_eq!(store.peek("other"), Some(s("value")));
    assert_eq!(log.count_of(EventType::Removed), 1);
}

#[test]
fn second_removal_returns_false() {
    let (cache, _, log) = cache_over(FlakyStore::with_entries(&[("key", "value")]));
    assert!(cache.remove_value(s("key"), s("value")));
    assert!(!cache.remove_value(s("key"), s("value")));
    assert_eq!(log.count(), 1);
}

#[test]
fn events_follow_mutation_order() {
    let (cache, _, log) = cache_over(FlakyStore::new());
    cache.put(s("key"), s("a"));
    cache.put(s("key"), s("b"));
    assert!(!cache.remove_value(s("key"), s("a")));
    assert!(cache.remove_value(s("key"), s("b")));
    assert_eq!(
        log.events(),
        vec![
            Seen::created("key", "a"),
            Seen::updated("key", "a", "b"),
            Seen::removed("key", "b"),
        ]
    );
}

// ----------------------------------------------
// Store failure
// ----------------------------------------------

#[test]
fn store_failure_degrades_to_false_without_events() {
    let (cache, store, log) = cache_over(FlakyStore::with_entries(&[("key", "value")]));
    store.set_offline(true);

    assert!(!cache.remove_value(s("key"), s("value")));
    assert_eq!(log.count(), 0);

    store.set_offline(false);
    assert_eq!(store.peek("key"), Some(s("value")));
}

/// Strategy that claims every conditional removal succeeded.
#[derive(Default)]
struct Optimistic {
    remove_value_calls: AtomicUsize,
}

impl ResilienceStrategy<String, String> for Optimistic {
    fn get_failure(&self, _failure: Failure<'_, String>) -> Option<Arc<String>> {
        None
    }

    fn contains_key_failure(&self, _failure: Failure<'_, String>) -> bool {
        false
    }

    fn put_failure(&self, _failure: Failure<'_, String>, _value: &Arc<String>) {}

    fn put_if_absent_failure(
        &self,
        _failure: Failure<'_, String>,
        _value: &Arc<String>,
    ) -> Option<Arc<String>> {
        None
    }

    fn replace_failure(
        &self,
        _failure: Failure<'_, String>,
        _value: &Arc<String>,
    ) -> Option<Arc<String>> {
        None
    }

    fn replace_if_equal_failure(
        &self,
        _failure: Failure<'_, String>,
        _expected: &Arc<String>,
        _replacement: &Arc<String>,
    ) -> bool {
        false
    }

    fn remove_failure(&self, _failure: Failure<'_, String>) -> Option<Arc<String>> {
        None
    }

    fn remove_value_failure(&self, failure: Failure<'_, String>, expected: &Arc<String>) -> bool {
        assert_eq!(failure.operation, Operation::RemoveValue);
        assert_eq!(failure.key, "key");
        assert_eq!(expected.as_str(), "value");
        assert!(matches!(failure.cause, StoreAccessError::Unavailable { .. }));
        self.remove_value_calls.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn clear_failure(&self, _cause: &StoreAccessError) {}
}

#[test]
fn strategy_result_is_returned_and_no_event_fires() {
    let log = EventLog::default();
    let strategy = Arc::new(Optimistic::default());
    let store = Arc::new(FlakyStore::with_entries(&[("key", "value")]));
    let cache = CacheBuilder::<String, String>::new()
        .listener(log.clone())
        .resilience(Arc::clone(&strategy))
        .build_with_store(Arc::clone(&store));
    store.set_offline(true);

    assert!(cache.remove_value(s("key"), s("value")));
    assert_eq!(strategy.remove_value_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.count(), 0);
}
