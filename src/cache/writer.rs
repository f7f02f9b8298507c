//! Background writer lane for fire-and-forget store mutations.

use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::stats::CacheStats;
use crate::query::Statement;
use crate::store::StoreDriver;
use crate::{Error, Result};

/// Owns the writer thread; dropping it drains the queue and joins.
///
/// A failed store write is logged and counted, never raised: the cache
/// already reflects the mutation, so the two sides diverge until the
/// caller intervenes. Cache state itself is never touched from here.
pub(crate) struct StoreWriter {
    tx: Option<Sender<Statement>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWriter {
    /// Spawn the writer thread over the shared driver handle.
    pub(crate) fn spawn(driver: Arc<dyn StoreDriver>, stats: Arc<CacheStats>) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Statement>();
        let handle = thread::Builder::new()
            .name("mirrorcache-store-writer".to_string())
            .spawn(move || {
                for statement in rx {
                    match driver.execute(&statement) {
                        Ok(_) => {
                            stats.store_writes.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            stats.store_write_failures.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                "store write failed, cache and store may diverge: {} ({})",
                                err,
                                statement.text
                            );
                        }
                    }
                }
            })?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Enqueue one statement; returns once it is queued, not executed.
    pub(crate) fn submit(&self, statement: Statement) -> Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(statement)
                .map_err(|_| Error::store("store writer has shut down")),
            None => Err(Error::store("store writer has shut down")),
        }
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
