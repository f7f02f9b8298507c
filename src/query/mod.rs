//! Query builder and executor.
//!
//! A `Query` is built fluently for one of the five request kinds, then
//! executed against a [`Cache`]: reads are served from the in-memory
//! mirror when the cache is warmed up and the request allows it, writes
//! go to both the mirror and the store. Builder methods return
//! `Result<Query>` so a method called on an incompatible kind surfaces as
//! a typed error while valid chains compose with `?`.

mod statement;

pub use statement::Statement;

use std::sync::atomic::Ordering;

use crate::cache::Cache;
use crate::types::{Criterion, QueryKind, RowMap};
use crate::{Error, Result};

/// One request against the cache and its backing store.
#[derive(Debug, Clone)]
pub struct Query {
    kind: QueryKind,
    table: String,
    use_cache: bool,
    filters: Vec<String>,
    wheres: Vec<Criterion>,
    assignments: Vec<Criterion>,
    direct: Option<String>,
}

impl Query {
    /// Create a request of the given kind against the named table.
    pub fn new(kind: QueryKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            use_cache: true,
            filters: Vec::new(),
            wheres: Vec::new(),
            assignments: Vec::new(),
            direct: None,
        }
    }

    /// An INSERT request.
    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Insert, table)
    }

    /// A SELECT request.
    pub fn select(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Select, table)
    }

    /// An UPDATE request.
    pub fn update(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Update, table)
    }

    /// A DELETE request.
    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Delete, table)
    }

    /// A DIRECT request carrying a caller-supplied raw statement.
    pub fn direct(table: impl Into<String>) -> Self {
        Self::new(QueryKind::Direct, table)
    }

    /// Request kind.
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether this request may be served from the cache.
    pub fn uses_cache(&self) -> bool {
        self.use_cache
    }

    /// Route this request straight to the store, ignoring the cache.
    pub fn bypass_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Add a WHERE predicate. Valid for SELECT, UPDATE and DELETE.
    pub fn where_eq(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        if !self.kind.supports_where() {
            return Err(self.invalid_op("where_eq"));
        }
        self.wheres.push(Criterion::new(key, value));
        Ok(self)
    }

    /// Add a value assignment. Valid for INSERT and UPDATE.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        if !self.kind.supports_assignments() {
            return Err(self.invalid_op("set"));
        }
        self.assignments.push(Criterion::new(key, value));
        Ok(self)
    }

    /// Add a value assignment and project its column. Valid for INSERT
    /// and UPDATE.
    pub fn set_projected(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        if !self.kind.supports_assignments() {
            return Err(self.invalid_op("set_projected"));
        }
        let key = key.into();
        self.filters.push(key.clone());
        self.assignments.push(Criterion::new(key, value));
        Ok(self)
    }

    /// Add a column to the projection set. Valid for INSERT and SELECT.
    pub fn project(mut self, key: impl Into<String>) -> Result<Self> {
        if !self.kind.supports_projection() {
            return Err(self.invalid_op("project"));
        }
        self.filters.push(key.into());
        Ok(self)
    }

    /// Supply the raw statement text. Valid only for DIRECT.
    pub fn raw(mut self, text: impl Into<String>) -> Result<Self> {
        if self.kind != QueryKind::Direct {
            return Err(self.invalid_op("raw"));
        }
        self.direct = Some(text.into());
        Ok(self)
    }

    /// Fetch the first matching row. Valid for SELECT.
    ///
    /// No match is `Ok(None)`, never an error.
    pub fn fetch_one(&self, cache: &Cache) -> Result<Option<RowMap>> {
        if self.kind != QueryKind::Select {
            return Err(self.invalid_op("fetch_one"));
        }
        if self.cache_eligible(cache) {
            cache.stats().cache_reads.fetch_add(1, Ordering::Relaxed);
            cache.table(&self.table)?.select(&self.filters, &self.wheres)
        } else {
            let stmt = self.statement()?;
            cache.stats().store_reads.fetch_add(1, Ordering::Relaxed);
            Ok(cache.driver().query(&stmt)?.into_iter().next())
        }
    }

    /// Fetch every matching row. Valid for SELECT and DIRECT.
    ///
    /// DIRECT requests always run against the store verbatim.
    pub fn fetch_all(&self, cache: &Cache) -> Result<Vec<RowMap>> {
        match self.kind {
            QueryKind::Select => {
                if self.cache_eligible(cache) {
                    cache.stats().cache_reads.fetch_add(1, Ordering::Relaxed);
                    cache
                        .table(&self.table)?
                        .select_all(&self.filters, &self.wheres)
                } else {
                    let stmt = self.statement()?;
                    cache.stats().store_reads.fetch_add(1, Ordering::Relaxed);
                    cache.driver().query(&stmt)
                }
            }
            QueryKind::Direct => {
                let stmt = self.statement()?;
                cache.stats().store_reads.fetch_add(1, Ordering::Relaxed);
                cache.driver().query(&stmt)
            }
            _ => Err(self.invalid_op("fetch_all")),
        }
    }

    /// Apply a mutation. Valid for INSERT, UPDATE and DELETE.
    ///
    /// UPDATE and DELETE mutate the cached table synchronously (when the
    /// request is cache-eligible) and submit the equivalent statement to
    /// the store through the configured write mode. An UPDATE with no
    /// assignments is a logged no-op. INSERT delegates to
    /// [`apply_returning_id`](Self::apply_returning_id) and discards the id.
    pub fn apply(&self, cache: &Cache) -> Result<()> {
        match self.kind {
            QueryKind::Insert => self.apply_returning_id(cache).map(|_| ()),
            QueryKind::Update => {
                if self.assignments.is_empty() {
                    tracing::warn!(
                        "UPDATE on `{}` has no assignments; nothing to do",
                        self.table
                    );
                    return Ok(());
                }
                let stmt = self.statement()?;
                if self.cache_eligible(cache) {
                    cache.table(&self.table)?.update(&self.wheres, &self.assignments)?;
                    cache.stats().cache_writes.fetch_add(1, Ordering::Relaxed);
                }
                cache.submit_store_write(stmt)
            }
            QueryKind::Delete => {
                let stmt = self.statement()?;
                if self.cache_eligible(cache) {
                    cache.table(&self.table)?.remove(&self.wheres)?;
                    cache.stats().cache_writes.fetch_add(1, Ordering::Relaxed);
                }
                cache.submit_store_write(stmt)
            }
            _ => Err(self.invalid_op("apply")),
        }
    }

    /// Apply an INSERT and return the store-assigned row id.
    ///
    /// The store is always issued the insert first (blocking, regardless
    /// of the configured write mode) so the cache can record the same id.
    pub fn apply_returning_id(&self, cache: &Cache) -> Result<i64> {
        if self.kind != QueryKind::Insert {
            return Err(self.invalid_op("apply_returning_id"));
        }
        let stmt = self.statement()?;
        let id = cache.driver().insert_returning_id(&stmt)?;
        cache.stats().store_writes.fetch_add(1, Ordering::Relaxed);
        if self.cache_eligible(cache) {
            cache.table(&self.table)?.add(&self.assignments, Some(id))?;
            cache.stats().cache_writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(id)
    }

    fn cache_eligible(&self, cache: &Cache) -> bool {
        self.use_cache && cache.is_optimized()
    }

    fn invalid_op(&self, op: &'static str) -> Error {
        tracing::warn!("{} is not valid for {} queries", op, self.kind);
        Error::InvalidOperationForKind {
            op,
            kind: self.kind,
        }
    }

    pub(crate) fn filters(&self) -> &[String] {
        &self.filters
    }

    pub(crate) fn predicates(&self) -> &[Criterion] {
        &self.wheres
    }

    pub(crate) fn assignments(&self) -> &[Criterion] {
        &self.assignments
    }

    pub(crate) fn direct_text(&self) -> Option<String> {
        self.direct.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_rejects_wrong_kind() {
        let err = Query::insert("users").where_eq("id", "1").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOperationForKind {
                op: "where_eq",
                kind: QueryKind::Insert,
            }
        ));

        let err = Query::select("users").set("a", "b").unwrap_err();
        assert!(err.is_invalid_operation());

        let err = Query::delete("users").project("id").unwrap_err();
        assert!(err.is_invalid_operation());

        let err = Query::select("users").raw("SELECT 1").unwrap_err();
        assert!(err.is_invalid_operation());
    }

    #[test]
    fn test_builder_accepts_valid_chains() {
        let query = Query::select("users")
            .project("username")
            .unwrap()
            .where_eq("id", "1")
            .unwrap();
        assert_eq!(query.kind(), QueryKind::Select);
        assert_eq!(query.filters(), ["username"]);
        assert_eq!(query.predicates().len(), 1);

        let query = Query::update("users")
            .set("username", "bob")
            .unwrap()
            .where_eq("id", "1")
            .unwrap();
        assert_eq!(query.assignments().len(), 1);
        assert_eq!(query.predicates().len(), 1);
    }

    #[test]
    fn test_set_projected_records_both() {
        let query = Query::insert("users").set_projected("username", "alice").unwrap();
        assert_eq!(query.filters(), ["username"]);
        assert_eq!(query.assignments()[0], Criterion::new("username", "alice"));
    }

    #[test]
    fn test_bypass_cache_flag() {
        let query = Query::select("users");
        assert!(query.uses_cache());
        assert!(!query.bypass_cache().uses_cache());
    }
}
