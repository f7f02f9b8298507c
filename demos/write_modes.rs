//! Demo of blocking vs. fire-and-forget store writes.
//!
//! Inserts always block - the store assigns the row id - while updates
//! and deletes can ride the background writer lane.
//!
//! Run with: cargo run --example write_modes

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mirrorcache::{
    Cache, Options, Query, SqliteDriver, Statement, StoreDriver, WriteMode,
};
use tempfile::TempDir;

fn main() -> mirrorcache::Result<()> {
    let dir = TempDir::new().expect("failed to create temp dir");
    let driver = Arc::new(SqliteDriver::new(dir.path().join("demo.db")));
    driver.connect()?;
    driver.execute(&Statement::new(
        "CREATE TABLE events (id INTEGER PRIMARY KEY AUTOINCREMENT, \
         label TEXT NOT NULL DEFAULT '')",
    ))?;

    let options = Options::builder()
        .table("events")
        .write_mode(WriteMode::FireAndForget)
        .build()?;
    let cache = Cache::new(options, driver)?;
    cache.initialize()?;

    // Inserts block either way: the id comes back from the store.
    for i in 0..10 {
        Query::insert("events")
            .set("label", format!("event-{}", i))?
            .apply(&cache)?;
    }
    println!("cache rows after inserts: {}", cache.table("events")?.len()?);

    // Deletes return as soon as the cache is updated and the store write
    // is queued on the background lane.
    Query::delete("events").where_eq("id", "1")?.apply(&cache)?;
    println!("cache rows after delete: {}", cache.table("events")?.len()?);

    // Give the writer lane a moment, then compare with the store.
    thread::sleep(Duration::from_millis(100));
    let store_rows = Query::select("events").bypass_cache().fetch_all(&cache)?;
    println!("store rows after delete: {}", store_rows.len());
    println!(
        "store write failures: {}",
        cache
            .stats()
            .store_write_failures
            .load(std::sync::atomic::Ordering::Relaxed)
    );

    Ok(())
}
