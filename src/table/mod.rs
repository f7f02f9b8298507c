//! In-memory mirror of one backing-store table.
//!
//! A `Table` holds the introspected schema and every row of the mirrored
//! store table, in insertion order. All CRUD here is purely in memory;
//! write-through to the store is the query executor's job.
//!
//! # Thread safety
//!
//! The schema and row collection sit behind a single `RwLock`: reads run
//! concurrently and return independent copies, writers are exclusive.

mod column;
mod row;

pub use column::Column;
pub use row::Row;

use parking_lot::RwLock;

use crate::types::{Criterion, FieldInfo, RowMap};
use crate::{Error, Result};
use column::Schema;

#[derive(Debug)]
struct TableInner {
    schema: Schema,
    rows: Vec<Row>,
}

impl TableInner {
    /// Primary value of the last row, or 0 when the table is empty or has
    /// no primary column. Insertion order defines "last".
    fn last_primary_value(&self) -> i64 {
        match (self.schema.primary_index(), self.rows.last()) {
            (Some(p), Some(row)) => row.get(p).parse().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Named in-memory mirror of one backing-store table.
#[derive(Debug)]
pub struct Table {
    name: String,
    inner: RwLock<Option<TableInner>>,
}

impl Table {
    /// Create an empty table from introspected fields.
    ///
    /// Rejects schemas declaring more than one primary column.
    pub fn new(name: impl Into<String>, fields: &[FieldInfo]) -> Result<Self> {
        let name = name.into();
        let schema = Schema::from_fields(&name, fields)?;
        Ok(Self {
            name,
            inner: RwLock::new(Some(TableInner {
                schema,
                rows: Vec::new(),
            })),
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a row built from the directives.
    ///
    /// When `assigned_id` is given and the table has a primary column, the
    /// new row's primary value is forced to that id (used after the store
    /// assigns an auto-increment).
    pub fn add(&self, directives: &[Criterion], assigned_id: Option<i64>) -> Result<()> {
        let mut guard = self.inner.write();
        let inner = self.require_mut(&mut guard)?;
        let last = inner.last_primary_value();
        let mut row = Row::from_directives(&inner.schema, directives, last);
        if let (Some(id), Some(p)) = (assigned_id, inner.schema.primary_index()) {
            row.set(p, id.to_string());
        }
        inner.rows.push(row);
        Ok(())
    }

    /// Remove every row matching **all** criteria by exact string equality.
    ///
    /// Returns the number of rows removed; 0 when none match. An empty
    /// criteria list matches every row.
    pub fn remove(&self, criteria: &[Criterion]) -> Result<usize> {
        let mut guard = self.inner.write();
        let TableInner { schema, rows } = self.require_mut(&mut guard)?;
        let schema = &*schema;
        let before = rows.len();
        rows.retain(|row| !row.matches(schema, criteria));
        Ok(before - rows.len())
    }

    /// Overwrite the named columns of every row matching all `wheres`.
    ///
    /// An empty `updates` list is a no-op returning `Ok(0)`. Update
    /// directives naming no schema column are skipped. Returns the number
    /// of rows touched.
    pub fn update(&self, wheres: &[Criterion], updates: &[Criterion]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let mut guard = self.inner.write();
        let TableInner { schema, rows } = self.require_mut(&mut guard)?;
        let schema = &*schema;
        let mut touched = 0;
        for row in rows.iter_mut().filter(|row| row.matches(schema, wheres)) {
            for update in updates {
                if let Some(i) = schema.index_of(&update.key) {
                    row.set(i, update.value.clone());
                }
            }
            touched += 1;
        }
        Ok(touched)
    }

    /// First row matching all `wheres`, or `None`.
    ///
    /// "No match" is an empty result, never an error.
    pub fn select(&self, filters: &[String], wheres: &[Criterion]) -> Result<Option<RowMap>> {
        Ok(self.select_all(filters, wheres)?.into_iter().next())
    }

    /// All rows matching all `wheres` (every row when `wheres` is empty).
    ///
    /// Each result is a fresh copy; a non-empty `filters` list retains
    /// exactly those column keys.
    pub fn select_all(&self, filters: &[String], wheres: &[Criterion]) -> Result<Vec<RowMap>> {
        let guard = self.inner.read();
        let inner = self.require(&guard)?;
        let mut out = Vec::new();
        for row in inner.rows.iter().filter(|row| row.matches(&inner.schema, wheres)) {
            let mut map = row.as_map(&inner.schema);
            if !filters.is_empty() {
                map.retain(|key, _| filters.iter().any(|f| f == key));
            }
            out.push(map);
        }
        Ok(out)
    }

    /// Release schema and rows, leaving the table unusable.
    ///
    /// Idempotent; later operations return `TableCleared`.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Schema columns, in declared order.
    pub fn columns(&self) -> Result<Vec<Column>> {
        let guard = self.inner.read();
        Ok(self.require(&guard)?.schema.columns().to_vec())
    }

    /// Whether the table has a primary-key column.
    pub fn has_primary_column(&self) -> Result<bool> {
        let guard = self.inner.read();
        Ok(self.require(&guard)?.schema.primary_index().is_some())
    }

    /// Number of cached rows.
    pub fn len(&self) -> Result<usize> {
        let guard = self.inner.read();
        Ok(self.require(&guard)?.rows.len())
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Primary value of the last inserted row; 0 for an empty table.
    pub fn last_primary_value(&self) -> Result<i64> {
        let guard = self.inner.read();
        Ok(self.require(&guard)?.last_primary_value())
    }

    fn require<'a>(&self, guard: &'a Option<TableInner>) -> Result<&'a TableInner> {
        guard
            .as_ref()
            .ok_or_else(|| Error::TableCleared(self.name.clone()))
    }

    fn require_mut<'a>(&self, guard: &'a mut Option<TableInner>) -> Result<&'a mut TableInner> {
        guard
            .as_mut()
            .ok_or_else(|| Error::TableCleared(self.name.clone()))
    }
}
