//! SQLite implementation of the store driver.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ToSql};

use super::StoreDriver;
use crate::query::Statement;
use crate::types::{FieldInfo, RowMap};
use crate::{Error, Result};

enum Location {
    Memory,
    File(PathBuf),
}

/// Store driver backed by a single rusqlite connection.
///
/// The connection is guarded by a mutex so only one statement is ever
/// outstanding, matching the single-handle resource model.
pub struct SqliteDriver {
    location: Location,
    busy_timeout: Mutex<Option<Duration>>,
    conn: Mutex<Option<Connection>>,
}

impl SqliteDriver {
    /// Driver for a database file at the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            location: Location::File(path.as_ref().to_path_buf()),
            busy_timeout: Mutex::new(None),
            conn: Mutex::new(None),
        }
    }

    /// Driver for a private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            busy_timeout: Mutex::new(None),
            conn: Mutex::new(None),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(Error::NotConnected)?;
        f(conn)
    }
}

/// Named parameters in the `:key` form rusqlite binds by.
fn named_params(statement: &Statement) -> Vec<(String, &str)> {
    statement
        .params
        .iter()
        .map(|(key, value)| (format!(":{}", key), value.as_str()))
        .collect()
}

fn bind<'a>(named: &'a [(String, &'a str)]) -> Vec<(&'a str, &'a dyn ToSql)> {
    named
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

/// Render a stored value the way the cache holds it: plain text.
fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

fn store_err(err: rusqlite::Error) -> Error {
    Error::Store(err.to_string())
}

impl StoreDriver for SqliteDriver {
    fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        if guard.is_some() {
            return Ok(());
        }
        let conn = match &self.location {
            Location::Memory => Connection::open_in_memory(),
            Location::File(path) => Connection::open(path),
        }
        .map_err(|e| Error::ConnectionFailure(e.to_string()))?;
        if let Some(timeout) = *self.busy_timeout.lock() {
            conn.busy_timeout(timeout)
                .map_err(|e| Error::ConnectionFailure(e.to_string()))?;
        }
        *guard = Some(conn);
        Ok(())
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&statement.text).map_err(store_err)?;
            let named = named_params(statement);
            stmt.execute(bind(&named).as_slice()).map_err(store_err)
        })
    }

    fn query(&self, statement: &Statement) -> Result<Vec<RowMap>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&statement.text).map_err(store_err)?;
            let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
            let named = named_params(statement);
            let mut rows = stmt.query(bind(&named).as_slice()).map_err(store_err)?;
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(store_err)? {
                let mut map = RowMap::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    let value = row.get_ref(i).map_err(store_err)?;
                    map.insert(column.clone(), value_to_string(value));
                }
                out.push(map);
            }
            Ok(out)
        })
    }

    fn insert_returning_id(&self, statement: &Statement) -> Result<i64> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&statement.text).map_err(store_err)?;
            let named = named_params(statement);
            stmt.execute(bind(&named).as_slice()).map_err(store_err)?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn describe(&self, table: &str) -> Result<Vec<FieldInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("PRAGMA table_info({})", table))
                .map_err(store_err)?;
            let mut rows = stmt.query([]).map_err(store_err)?;
            let mut fields = Vec::new();
            while let Some(row) = rows.next().map_err(store_err)? {
                let name: String = row.get("name").map_err(store_err)?;
                let pk: i64 = row.get("pk").map_err(store_err)?;
                fields.push(FieldInfo::new(name, pk > 0));
            }
            if fields.is_empty() {
                return Err(Error::UnknownTable(table.to_string()));
            }
            Ok(fields)
        })
    }

    fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        *self.busy_timeout.lock() = Some(timeout);
        let guard = self.conn.lock();
        if let Some(conn) = guard.as_ref() {
            conn.busy_timeout(timeout).map_err(store_err)?;
        }
        Ok(())
    }
}
