//! Tests for the documented cache/store divergence under fire-and-forget
//! store writes.
//!
//! A store that fails its writes while the cache applies them must leave
//! the two sides observably different, without ever corrupting the cache.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mirrorcache::{
    Cache, Criterion, Error, FieldInfo, Options, Query, Result, RowMap, Statement, StoreDriver,
    WriteMode,
};

/// A store whose mutation path can be switched to fail on demand.
///
/// Reads and introspection always succeed so warm-up can run.
struct FailingStore {
    fail_writes: AtomicBool,
    applied_writes: AtomicUsize,
    seed_rows: Vec<RowMap>,
}

impl FailingStore {
    fn new(seed_rows: Vec<RowMap>) -> Self {
        Self {
            fail_writes: AtomicBool::new(false),
            applied_writes: AtomicUsize::new(0),
            seed_rows,
        }
    }
}

impl StoreDriver for FailingStore {
    fn connect(&self) -> Result<()> {
        Ok(())
    }

    fn execute(&self, _statement: &Statement) -> Result<usize> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::store("simulated store outage"));
        }
        self.applied_writes.fetch_add(1, Ordering::Relaxed);
        Ok(1)
    }

    fn query(&self, _statement: &Statement) -> Result<Vec<RowMap>> {
        Ok(self.seed_rows.clone())
    }

    fn insert_returning_id(&self, _statement: &Statement) -> Result<i64> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::store("simulated store outage"));
        }
        self.applied_writes.fetch_add(1, Ordering::Relaxed);
        Ok(self.seed_rows.len() as i64 + 1)
    }

    fn describe(&self, _table: &str) -> Result<Vec<FieldInfo>> {
        Ok(vec![
            FieldInfo::new("id", true),
            FieldInfo::new("name", false),
        ])
    }
}

fn seed_row(id: &str, name: &str) -> RowMap {
    let mut row = RowMap::new();
    row.insert("id".to_string(), id.to_string());
    row.insert("name".to_string(), name.to_string());
    row
}

fn fire_and_forget_cache(store: Arc<FailingStore>) -> Arc<Cache> {
    let options = Options::builder()
        .table("records")
        .write_mode(WriteMode::FireAndForget)
        .build()
        .unwrap();
    let cache = Cache::new(options, store).unwrap();
    cache.initialize().unwrap();
    cache
}

fn wait_for_failures(cache: &Cache, count: u64) {
    for _ in 0..200 {
        if cache.stats().store_write_failures.load(Ordering::Relaxed) >= count {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("store write failures never reached {}", count);
}

/// The cache reflects a delete the store never applied; the divergence is
/// visible through the counters and the cache stays fully readable.
#[test]
fn divergence_delete_reflected_only_in_cache() {
    let store = Arc::new(FailingStore::new(vec![
        seed_row("1", "a"),
        seed_row("2", "b"),
    ]));
    let cache = fire_and_forget_cache(store.clone());
    store.fail_writes.store(true, Ordering::Relaxed);

    // The call succeeds: the cache applied the delete and the store write
    // was queued.
    Query::delete("records")
        .where_eq("id", "1")
        .unwrap()
        .apply(&cache)
        .unwrap();
    wait_for_failures(&cache, 1);

    // Cache: row gone. Store: nothing ever applied.
    let rows = Query::select("records").fetch_all(&cache).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "2");
    assert_eq!(store.applied_writes.load(Ordering::Relaxed), 0);

    // Bounded: the cache is intact and keeps serving.
    let row = Query::select("records")
        .where_eq("id", "2")
        .unwrap()
        .fetch_one(&cache)
        .unwrap()
        .unwrap();
    assert_eq!(row["name"], "b");
    assert_eq!(cache.table("records").unwrap().len().unwrap(), 1);
}

/// Updates diverge the same way and recover once the store comes back.
#[test]
fn divergence_is_bounded_and_recoverable() {
    let store = Arc::new(FailingStore::new(vec![seed_row("1", "a")]));
    let cache = fire_and_forget_cache(store.clone());
    store.fail_writes.store(true, Ordering::Relaxed);

    Query::update("records")
        .set("name", "alpha")
        .unwrap()
        .where_eq("id", "1")
        .unwrap()
        .apply(&cache)
        .unwrap();
    wait_for_failures(&cache, 1);

    let row = Query::select("records").fetch_one(&cache).unwrap().unwrap();
    assert_eq!(row["name"], "alpha");
    assert_eq!(store.applied_writes.load(Ordering::Relaxed), 0);

    // Store recovers; later writes land again.
    store.fail_writes.store(false, Ordering::Relaxed);
    Query::update("records")
        .set("name", "beta")
        .unwrap()
        .where_eq("id", "1")
        .unwrap()
        .apply(&cache)
        .unwrap();
    for _ in 0..200 {
        if store.applied_writes.load(Ordering::Relaxed) == 1 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(store.applied_writes.load(Ordering::Relaxed), 1);
    assert_eq!(
        cache.stats().store_write_failures.load(Ordering::Relaxed),
        1
    );
}

/// Inserts never diverge silently: the id comes from the store, so a
/// store outage fails the insert before the cache records anything.
#[test]
fn divergence_insert_fails_closed() {
    let store = Arc::new(FailingStore::new(vec![seed_row("1", "a")]));
    let cache = fire_and_forget_cache(store.clone());
    store.fail_writes.store(true, Ordering::Relaxed);

    let err = Query::insert("records")
        .set("name", "b")
        .unwrap()
        .apply_returning_id(&cache)
        .unwrap_err();
    assert!(err.is_store_side());
    assert_eq!(cache.table("records").unwrap().len().unwrap(), 1);
}

/// In blocking mode the same outage surfaces to the caller, with the
/// cache mutation already applied - reported, not hidden.
#[test]
fn divergence_blocking_mode_reports_store_errors() {
    let store = Arc::new(FailingStore::new(vec![seed_row("1", "a")]));
    let options = Options::builder()
        .table("records")
        .write_mode(WriteMode::Blocking)
        .build()
        .unwrap();
    let cache = Cache::new(options, store.clone()).unwrap();
    cache.initialize().unwrap();
    store.fail_writes.store(true, Ordering::Relaxed);

    let err = Query::delete("records")
        .where_eq("id", "1")
        .unwrap()
        .apply(&cache)
        .unwrap_err();
    assert!(err.is_store_side());

    // The caller knows; the mirror already dropped the row.
    let remaining = cache
        .table("records")
        .unwrap()
        .select_all(&[], &[Criterion::new("id", "1")])
        .unwrap();
    assert!(remaining.is_empty());
}
