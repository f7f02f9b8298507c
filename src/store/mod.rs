//! Backing-store driver boundary.
//!
//! The cache talks to its relational store exclusively through the
//! [`StoreDriver`] trait, so tests can substitute mock stores and the
//! SQLite implementation stays swappable.

mod sqlite;

pub use sqlite::SqliteDriver;

use std::time::Duration;

use crate::query::Statement;
use crate::types::{FieldInfo, RowMap};
use crate::Result;

/// A connection to the relational backing store.
///
/// Implementations hold a single connection handle and must serialize
/// access to it internally; the cache issues at most the calls below and
/// never assumes more than one outstanding statement.
pub trait StoreDriver: Send + Sync {
    /// Open the underlying connection. Idempotent.
    fn connect(&self) -> Result<()>;

    /// Execute a mutation statement; returns the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<usize>;

    /// Execute a read statement and materialize every result row.
    fn query(&self, statement: &Statement) -> Result<Vec<RowMap>>;

    /// Execute an insert and return the store-assigned row id.
    fn insert_returning_id(&self, statement: &Statement) -> Result<i64>;

    /// Introspect the named table's schema.
    fn describe(&self, table: &str) -> Result<Vec<FieldInfo>>;

    /// Apply a per-call deadline, where the store supports one.
    ///
    /// The default implementation ignores the deadline.
    fn set_busy_timeout(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}
