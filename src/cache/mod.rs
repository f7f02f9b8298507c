//! Cache manager - table registry and lifecycle.
//!
//! The `Cache` is the context object every request runs against. It owns:
//! - the backing-store driver handle,
//! - the registry of mirrored tables,
//! - the lifecycle state machine (cold, connected, warmed up),
//! - traffic counters and the fire-and-forget writer lane.
//!
//! There is no process-wide state; independent `Cache` instances can
//! coexist, each over its own store.
//!
//! # Thread safety
//!
//! The Cache is thread-safe and shared across threads as `Arc<Cache>`.
//! The registry and state sit behind `RwLock`s; tables are handed out as
//! `Arc<Table>` and guard themselves.

mod stats;
mod writer;

pub use stats::CacheStats;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::options::{Options, WriteMode};
use crate::query::{Query, Statement};
use crate::store::StoreDriver;
use crate::table::Table;
use crate::types::Criterion;
use crate::{Error, Result};
use writer::StoreWriter;

/// Lifecycle state of a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No connection has been opened yet.
    Uninitialized,
    /// `initialize` is opening the store connection.
    Connecting,
    /// Connected; every request routes to the store.
    ConnectedUnoptimized,
    /// Warm-up is loading the configured tables.
    Optimizing,
    /// All configured tables are mirrored; reads are served from memory.
    Optimized,
}

impl CacheState {
    /// Whether reads are currently served from the mirror.
    pub fn is_optimized(&self) -> bool {
        matches!(self, CacheState::Optimized)
    }
}

/// Write-through cache over one relational backing store.
pub struct Cache {
    options: Options,
    driver: Arc<dyn StoreDriver>,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    state: RwLock<CacheState>,
    stats: Arc<CacheStats>,
    writer: Mutex<Option<StoreWriter>>,
}

impl Cache {
    /// Create a cold cache over the given driver.
    ///
    /// No I/O happens here; call [`initialize`](Self::initialize) to open
    /// the connection and (optionally) warm up.
    pub fn new(options: Options, driver: Arc<dyn StoreDriver>) -> Result<Arc<Self>> {
        options.validate()?;
        Ok(Arc::new(Self {
            options,
            driver,
            tables: RwLock::new(HashMap::new()),
            state: RwLock::new(CacheState::Uninitialized),
            stats: Arc::new(CacheStats::new()),
            writer: Mutex::new(None),
        }))
    }

    /// Open the store connection and, when configured, warm up the cache.
    ///
    /// Idempotent: a second call returns immediately without re-running
    /// warm-up or touching the registry. A connection failure leaves the
    /// cache `Uninitialized` and is returned as `ConnectionFailure`; there
    /// is no automatic retry - callers re-invoke when they want one.
    pub fn initialize(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != CacheState::Uninitialized {
                tracing::debug!("cache is already initialized");
                return Ok(());
            }
            *state = CacheState::Connecting;
        }

        tracing::info!("connecting to backing store");
        if let Err(err) = self.driver.connect() {
            tracing::warn!("backing store connection failed: {}", err);
            *self.state.write() = CacheState::Uninitialized;
            return Err(err);
        }
        // The connection is open from here on; failures below leave the
        // cache connected but cold.
        *self.state.write() = CacheState::ConnectedUnoptimized;
        if let Some(timeout) = self.options.store_timeout {
            self.driver.set_busy_timeout(timeout)?;
        }
        if self.options.write_mode == WriteMode::FireAndForget {
            let writer = StoreWriter::spawn(Arc::clone(&self.driver), Arc::clone(&self.stats))?;
            *self.writer.lock() = Some(writer);
        }

        if self.options.optimize {
            *self.state.write() = CacheState::Optimizing;
            if let Err(err) = self.warm_up() {
                *self.state.write() = CacheState::ConnectedUnoptimized;
                return Err(err);
            }
            *self.state.write() = CacheState::Optimized;
            tracing::info!("cache warmed up with {} tables", self.options.tables.len());
        } else {
            tracing::info!("connected; cache stays cold until start_up");
        }
        Ok(())
    }

    /// Warm up and start serving reads from memory.
    ///
    /// A no-op when already running; `NotInitialized` when `initialize`
    /// has not succeeded yet.
    pub fn start_up(&self) -> Result<()> {
        match self.state() {
            CacheState::Uninitialized | CacheState::Connecting => Err(Error::NotInitialized),
            CacheState::Optimized | CacheState::Optimizing => {
                tracing::debug!("cache is already running");
                Ok(())
            }
            CacheState::ConnectedUnoptimized => {
                *self.state.write() = CacheState::Optimizing;
                match self.warm_up() {
                    Ok(()) => {
                        *self.state.write() = CacheState::Optimized;
                        Ok(())
                    }
                    Err(err) => {
                        *self.state.write() = CacheState::ConnectedUnoptimized;
                        Err(err)
                    }
                }
            }
        }
    }

    /// Release every mirrored table and route requests to the store.
    ///
    /// The store connection stays open. A no-op when the cache is not
    /// running.
    pub fn shutdown(&self) -> Result<()> {
        if self.state() != CacheState::Optimized {
            tracing::debug!("cache is not running; nothing to shut down");
            return Ok(());
        }
        tracing::info!("shutting down cache");
        self.clear_tables();
        *self.state.write() = CacheState::ConnectedUnoptimized;
        Ok(())
    }

    /// Rebuild the mirror from the store: shutdown followed by start_up.
    ///
    /// Useful for discarding a cache suspected of divergence; it can be a
    /// slow operation on large tables.
    pub fn restart(&self) -> Result<()> {
        self.shutdown()?;
        self.start_up()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CacheState {
        *self.state.read()
    }

    /// Whether reads are currently served from the mirror.
    pub fn is_optimized(&self) -> bool {
        self.state().is_optimized()
    }

    /// Look up a mirrored table.
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Traffic counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn driver(&self) -> &Arc<dyn StoreDriver> {
        &self.driver
    }

    /// Send a mutation statement to the store through the configured
    /// write mode.
    pub(crate) fn submit_store_write(&self, statement: Statement) -> Result<()> {
        if self.options.write_mode == WriteMode::FireAndForget {
            if let Some(writer) = self.writer.lock().as_ref() {
                return writer.submit(statement);
            }
        }
        self.driver.execute(&statement)?;
        self.stats.store_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Load every configured table, in declared order.
    ///
    /// Returns only after the last table finishes loading. On a mid-load
    /// failure every table loaded so far is cleared and deregistered so
    /// the registry is never left partially populated.
    fn warm_up(&self) -> Result<()> {
        for name in &self.options.tables {
            match self.load_table(name) {
                Ok(table) => {
                    self.tables.write().insert(name.clone(), Arc::new(table));
                }
                Err(err) => {
                    tracing::warn!("warm-up failed on `{}`: {}", name, err);
                    self.clear_tables();
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Build one table: schema introspection, then a full-scan load.
    fn load_table(&self, name: &str) -> Result<Table> {
        let fields = self.driver.describe(name)?;
        let table = Table::new(name, &fields)?;
        let scan = Query::select(name).statement()?;
        let rows = self.driver.query(&scan)?;
        tracing::debug!("loading `{}`: {} rows", name, rows.len());
        for row in &rows {
            let directives: Vec<Criterion> = row
                .iter()
                .map(|(key, value)| Criterion::new(key.clone(), value.clone()))
                .collect();
            table.add(&directives, None)?;
        }
        Ok(table)
    }

    fn clear_tables(&self) {
        let mut tables = self.tables.write();
        for table in tables.values() {
            table.clear();
        }
        tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldInfo, RowMap};
    use std::sync::atomic::AtomicUsize;

    /// Scripted in-memory store for lifecycle tests.
    struct ScriptedDriver {
        refuse_connection: bool,
        fail_describe_on: Option<String>,
        rows: Vec<RowMap>,
        describes: AtomicUsize,
    }

    impl ScriptedDriver {
        fn new() -> Self {
            Self {
                refuse_connection: false,
                fail_describe_on: None,
                rows: Vec::new(),
                describes: AtomicUsize::new(0),
            }
        }
    }

    impl StoreDriver for ScriptedDriver {
        fn connect(&self) -> Result<()> {
            if self.refuse_connection {
                return Err(Error::connection("refused"));
            }
            Ok(())
        }

        fn execute(&self, _statement: &Statement) -> Result<usize> {
            Ok(1)
        }

        fn query(&self, _statement: &Statement) -> Result<Vec<RowMap>> {
            Ok(self.rows.clone())
        }

        fn insert_returning_id(&self, _statement: &Statement) -> Result<i64> {
            Ok(1)
        }

        fn describe(&self, table: &str) -> Result<Vec<FieldInfo>> {
            self.describes.fetch_add(1, Ordering::Relaxed);
            if self.fail_describe_on.as_deref() == Some(table) {
                return Err(Error::UnknownTable(table.to_string()));
            }
            Ok(vec![
                FieldInfo::new("id", true),
                FieldInfo::new("name", false),
            ])
        }
    }

    fn options(tables: &[&str]) -> Options {
        Options {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            ..Options::default()
        }
    }

    #[test]
    fn test_initialize_warms_up_configured_tables() {
        let cache = Cache::new(
            options(&["users", "books"]),
            Arc::new(ScriptedDriver::new()),
        )
        .unwrap();
        assert_eq!(cache.state(), CacheState::Uninitialized);

        cache.initialize().unwrap();
        assert_eq!(cache.state(), CacheState::Optimized);
        assert!(cache.table("users").is_ok());
        assert!(cache.table("books").is_ok());
        assert!(matches!(
            cache.table("missing").unwrap_err(),
            Error::UnknownTable(_)
        ));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let driver = Arc::new(ScriptedDriver::new());
        let cache = Cache::new(options(&["users"]), driver.clone()).unwrap();
        cache.initialize().unwrap();
        let loaded = cache.table("users").unwrap();

        cache.initialize().unwrap();
        assert_eq!(driver.describes.load(Ordering::Relaxed), 1);
        // Same registry entry, not a reload.
        assert!(Arc::ptr_eq(&loaded, &cache.table("users").unwrap()));
    }

    #[test]
    fn test_connection_failure_leaves_cache_uninitialized() {
        let driver = Arc::new(ScriptedDriver {
            refuse_connection: true,
            ..ScriptedDriver::new()
        });
        let cache = Cache::new(options(&["users"]), driver).unwrap();

        let err = cache.initialize().unwrap_err();
        assert!(matches!(err, Error::ConnectionFailure(_)));
        assert_eq!(cache.state(), CacheState::Uninitialized);
    }

    #[test]
    fn test_warm_up_failure_clears_partial_registry() {
        let driver = Arc::new(ScriptedDriver {
            fail_describe_on: Some("books".to_string()),
            ..ScriptedDriver::new()
        });
        let cache = Cache::new(options(&["users", "books"]), driver).unwrap();

        assert!(cache.initialize().is_err());
        assert_eq!(cache.state(), CacheState::ConnectedUnoptimized);
        // The table that loaded before the failure is gone too.
        assert!(matches!(
            cache.table("users").unwrap_err(),
            Error::UnknownTable(_)
        ));
    }

    #[test]
    fn test_start_up_requires_initialize() {
        let cache = Cache::new(options(&["users"]), Arc::new(ScriptedDriver::new())).unwrap();
        assert!(matches!(
            cache.start_up().unwrap_err(),
            Error::NotInitialized
        ));
    }

    #[test]
    fn test_shutdown_and_restart() {
        let driver = Arc::new(ScriptedDriver::new());
        let cache = Cache::new(options(&["users"]), driver).unwrap();
        cache.initialize().unwrap();
        let stale = cache.table("users").unwrap();

        cache.shutdown().unwrap();
        assert_eq!(cache.state(), CacheState::ConnectedUnoptimized);
        assert!(cache.table("users").is_err());
        // Outstanding handles go stale rather than dangling.
        assert!(matches!(
            stale.select_all(&[], &[]).unwrap_err(),
            Error::TableCleared(_)
        ));
        // Shutting down twice is a no-op.
        cache.shutdown().unwrap();

        cache.restart().unwrap();
        assert_eq!(cache.state(), CacheState::Optimized);
        assert!(cache.table("users").is_ok());
    }

    #[test]
    fn test_unoptimized_initialize_stays_cold() {
        let driver = Arc::new(ScriptedDriver::new());
        let cache = Cache::new(
            Options {
                tables: vec!["users".to_string()],
                optimize: false,
                ..Options::default()
            },
            driver.clone(),
        )
        .unwrap();

        cache.initialize().unwrap();
        assert_eq!(cache.state(), CacheState::ConnectedUnoptimized);
        assert_eq!(driver.describes.load(Ordering::Relaxed), 0);
        assert!(cache.table("users").is_err());

        cache.start_up().unwrap();
        assert_eq!(cache.state(), CacheState::Optimized);
        assert!(cache.table("users").is_ok());
    }
}
