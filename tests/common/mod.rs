// ==============================================
// SHARED TEST DOUBLES
// ==============================================
//
// Store, loader-writer and listener doubles used by the integration suites.
// Each suite pulls in only what it needs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use cachekit_facade::error::{LoaderWriterError, StoreAccessError};
use cachekit_facade::event::{CacheEvent, CacheEventListener, EventType};
use cachekit_facade::loader_writer::CacheLoaderWriter;
use cachekit_facade::store::hashmap::ConcurrentHashMapStore;
use cachekit_facade::store::traits::{ComputeStore, Remapped};
use parking_lot::Mutex;

// ----------------------------------------------
// Event log
// ----------------------------------------------

/// Snapshot of one delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub kind: EventType,
    pub key: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl Seen {
    pub fn removed(key: &str, old: &str) -> Self {
        Self {
            kind: EventType::Removed,
            key: key.to_string(),
            old: Some(old.to_string()),
            new: None,
        }
    }

    pub fn created(key: &str, new: &str) -> Self {
        Self {
            kind: EventType::Created,
            key: key.to_string(),
            old: None,
            new: Some(new.to_string()),
        }
    }

    pub fn updated(key: &str, old: &str, new: &str) -> Self {
        Self {
            kind: EventType::Updated,
            key: key.to_string(),
            old: Some(old.to_string()),
            new: Some(new.to_string()),
        }
    }
}

/// Listener recording every event it receives.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn count_of(&self, kind: EventType) -> usize {
        self.seen.lock().iter().filter(|seen| seen.kind == kind).count()
    }
}

impl CacheEventListener<String, String> for EventLog {
    fn on_event(&self, event: &CacheEvent<String, String>) {
        self.seen.lock().push(Seen {
            kind: event.kind(),
            key: event.key().clone(),
            old: event.old_value().map(|v| v.to_string()),
            new: event.new_value().map(|v| v.to_string()),
        });
    }
}

// ----------------------------------------------
// Failure-injecting store
// ----------------------------------------------

/// Store that can be switched offline. While offline, every access fails
/// with `StoreAccessError::Unavailable` without running the remapping
/// function.
#[derive(Debug)]
pub struct FlakyStore {
    inner: ConcurrentHashMapStore<String, String>,
    offline: AtomicBool,
    computes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: ConcurrentHashMapStore::new(16),
            offline: AtomicBool::new(false),
            computes: AtomicUsize::new(0),
        }
    }

    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (key, value) in entries {
            let value = Arc::new(value.to_string());
            store
                .inner
                .compute(&key.to_string(), move |_| Ok(Some(value)), true)
                .expect("seeding an online store");
        }
        store
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `compute` calls that reached the store.
    pub fn computes(&self) -> usize {
        self.computes.load(Ordering::SeqCst)
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner
            .get(&key.to_string())
            .expect("inner store never fails")
            .map(|v| v.to_string())
    }

    fn check(&self) -> Result<(), StoreAccessError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreAccessError::unavailable("medium unreachable"))
        } else {
            Ok(())
        }
    }
}

impl ComputeStore<String, String> for FlakyStore {
    fn get(&self, key: &String) -> Result<Option<Arc<String>>, StoreAccessError> {
        self.check()?;
        self.inner.get(key)
    }

    fn compute<F>(
        &self,
        key: &String,
        remap: F,
        replace_equal: bool,
    ) -> Result<Option<Arc<String>>, StoreAccessError>
    where
        F: FnOnce(Option<&Arc<String>>) -> Remapped<String>,
    {
        self.computes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.compute(key, remap, replace_equal)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&self) -> Result<(), StoreAccessError> {
        self.check()?;
        self.inner.clear()
    }
}

// ----------------------------------------------
// Recording loader-writer
// ----------------------------------------------

/// In-memory system of record that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingLoaderWriter {
    pub records: Mutex<HashMap<String, String>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_writes: AtomicBool,
    pub fail_deletes: AtomicBool,
    pub fail_loads: AtomicBool,
}

impl RecordingLoaderWriter {
    pub fn with_records(records: &[(&str, &str)]) -> Self {
        let writer = Self::default();
        writer.records.lock().extend(
            records
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        writer
    }

    pub fn record(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CacheLoaderWriter<String, String> for RecordingLoaderWriter {
    fn load(&self, key: &String) -> Result<Option<String>, LoaderWriterError> {
        self.calls.lock().push(format!("load {key}"));
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(LoaderWriterError::Load("backend down".into()));
        }
        Ok(self.records.lock().get(key).cloned())
    }

    fn write(&self, key: &String, value: &String) -> Result<(), LoaderWriterError> {
        self.calls.lock().push(format!("write {key}={value}"));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LoaderWriterError::Write("backend down".into()));
        }
        self.records.lock().insert(key.clone(), value.clone());
        Ok(())
    }

    fn delete(&self, key: &String) -> Result<(), LoaderWriterError> {
        self.calls.lock().push(format!("delete {key}"));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(LoaderWriterError::Delete("backend down".into()));
        }
        self.records.lock().remove(key);
        Ok(())
    }
}

pub fn s(v: &str) -> String {
    v.to_string()
}
