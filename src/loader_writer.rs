//! Write-through persistence behind the cache.
//!
//! A [`CacheLoaderWriter`] is the system of record. The coordinator calls it
//! from inside the store's remapping function, so a write or delete runs
//! while the key's critical section is held: the in-memory mapping only
//! changes if the system of record accepted the change.
//!
//! Timeouts and retries are the implementation's business. Whatever it
//! reports as an error aborts the mutation.

use std::sync::Arc;

use crate::error::LoaderWriterError;

/// System of record consulted on misses and updated on every change.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use parking_lot::Mutex;
/// use cachekit_facade::error::LoaderWriterError;
/// use cachekit_facade::loader_writer::CacheLoaderWriter;
///
/// #[derive(Default)]
/// struct Table(Mutex<HashMap<u64, String>>);
///
/// impl CacheLoaderWriter<u64, String> for Table {
///     fn load(&self, key: &u64) -> Result<Option<String>, LoaderWriterError> {
///         Ok(self.0.lock().get(key).cloned())
///     }
///
///     fn write(&self, key: &u64, value: &String) -> Result<(), LoaderWriterError> {
///         self.0.lock().insert(*key, value.clone());
///         Ok(())
///     }
///
///     fn delete(&self, key: &u64) -> Result<(), LoaderWriterError> {
///         self.0.lock().remove(key);
///         Ok(())
///     }
/// }
/// ```
pub trait CacheLoaderWriter<K, V>: Send + Sync {
    /// Load the value for a key missing from the cache.
    ///
    /// The default loads nothing, making the cache write-only through this
    /// implementation.
    fn load(&self, key: &K) -> Result<Option<V>, LoaderWriterError> {
        let _ = key;
        Ok(None)
    }

    /// Persist `value` for `key`.
    fn write(&self, key: &K, value: &V) -> Result<(), LoaderWriterError>;

    /// Remove `key` from the system of record.
    fn delete(&self, key: &K) -> Result<(), LoaderWriterError>;
}

impl<K, V, T> CacheLoaderWriter<K, V> for Arc<T>
where
    T: CacheLoaderWriter<K, V> + ?Sized,
{
    fn load(&self, key: &K) -> Result<Option<V>, LoaderWriterError> {
        (**self).load(key)
    }

    fn write(&self, key: &K, value: &V) -> Result<(), LoaderWriterError> {
        (**self).write(key, value)
    }

    fn delete(&self, key: &K) -> Result<(), LoaderWriterError> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
    }

    impl CacheLoaderWriter<&'static str, u32> for Recording {
        fn write(&self, key: &&'static str, value: &u32) -> Result<(), LoaderWriterError> {
            self.calls.lock().push(format!("write {key}={value}"));
            Ok(())
        }

        fn delete(&self, key: &&'static str) -> Result<(), LoaderWriterError> {
            self.calls.lock().push(format!("delete {key}"));
            Ok(())
        }
    }

    #[test]
    fn default_load_finds_nothing() {
        let writer = Recording::default();
        assert_eq!(writer.load(&"k"), Ok(None));
    }

    #[test]
    fn arc_forwards_calls() {
        let writer = Arc::new(Recording::default());
        let shared: Arc<dyn CacheLoaderWriter<&'static str, u32>> = writer.clone();
        shared.write(&"k", &7).unwrap();
        shared.delete(&"k").unwrap();
        assert_eq!(*writer.calls.lock(), vec!["write k=7", "delete k"]);
    }
}
