//! Write-through cache in front of an in-memory "database".
//!
//! Run with: `RUST_LOG=cachekit_facade=trace cargo run --example write_through`

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cachekit_facade::builder::CacheBuilder;
use cachekit_facade::error::LoaderWriterError;
use cachekit_facade::event::{CacheEvent, EventType};
use cachekit_facade::loader_writer::CacheLoaderWriter;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stand-in for a remote database.
#[derive(Default)]
struct Database {
    rows: Mutex<HashMap<String, String>>,
    read_only: AtomicBool,
}

impl CacheLoaderWriter<String, String> for Database {
    fn load(&self, key: &String) -> Result<Option<String>, LoaderWriterError> {
        Ok(self.rows.lock().get(key).cloned())
    }

    fn write(&self, key: &String, value: &String) -> Result<(), LoaderWriterError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(LoaderWriterError::Write("database is read-only".into()));
        }
        self.rows.lock().insert(key.clone(), value.clone());
        Ok(())
    }

    fn delete(&self, key: &String) -> Result<(), LoaderWriterError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(LoaderWriterError::Delete("database is read-only".into()));
        }
        self.rows.lock().remove(key);
        Ok(())
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let db = Arc::new(Database::default());
    db.rows
        .lock()
        .insert("user:1".to_string(), "alice".to_string());

    let cache = CacheBuilder::<String, String>::new()
        .loader_writer(Arc::clone(&db))
        .listener(|event: &CacheEvent<String, String>| {
            println!(
                "   event {:<7} {} : {:?} -> {:?}",
                event.kind(),
                event.key(),
                event.old_value().map(|v| v.as_str()),
                event.new_value().map(|v| v.as_str()),
            );
        })
        .build();

    println!("=== Write-through cache ===\n");

    println!("1. Load on miss");
    println!("   get user:1 = {:?}", cache.get(&"user:1".to_string()));
    println!();

    println!("2. Writes reach the database");
    cache.put("user:2".to_string(), "bob".to_string());
    println!("   db user:2 = {:?}", db.rows.lock().get("user:2"));
    println!();

    println!("3. Conditional removal");
    let stale = cache.remove_value("user:2".to_string(), "robert".to_string());
    println!("   remove_value(user:2, robert) = {stale}");
    let removed = cache.remove_value("user:2".to_string(), "bob".to_string());
    println!("   remove_value(user:2, bob)    = {removed}");
    println!("   db user:2 = {:?}", db.rows.lock().get("user:2"));
    println!();

    println!("4. Failed delete keeps the entry");
    db.read_only.store(true, Ordering::SeqCst);
    let removed = cache.remove_value("user:1".to_string(), "alice".to_string());
    println!("   remove_value(user:1, alice) = {removed}");
    println!("   cached user:1 = {:?}", cache.get(&"user:1".to_string()));
    db.read_only.store(false, Ordering::SeqCst);
    println!();

    println!("5. Removal-only listener");
    let removals = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&removals);
    let id = cache.register_listener_for(
        &[EventType::Removed],
        move |_: &CacheEvent<String, String>| *counter.lock() += 1,
    );
    cache.remove(&"user:1".to_string());
    cache.deregister_listener(id);
    println!("   removals seen = {}", removals.lock());
}
