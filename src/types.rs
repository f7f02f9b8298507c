//! Core types for mirrorcache.

use std::collections::HashMap;
use std::fmt;

/// A materialized row: column key to stored value.
///
/// Rows handed out by the cache are always fresh copies; mutating a
/// `RowMap` never touches cache state.
pub type RowMap = HashMap<String, String>;

/// The kind of a query request.
///
/// The kind determines which builder operations are valid and which
/// statement template is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Insert a new row.
    Insert,
    /// Read one or more rows.
    Select,
    /// Overwrite column values of matching rows.
    Update,
    /// Remove matching rows.
    Delete,
    /// Caller-supplied raw statement, executed verbatim against the store.
    Direct,
}

impl QueryKind {
    /// Statement verb for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Insert => "INSERT",
            QueryKind::Select => "SELECT",
            QueryKind::Update => "UPDATE",
            QueryKind::Delete => "DELETE",
            QueryKind::Direct => "DIRECT",
        }
    }

    /// Whether WHERE predicates may be attached to this kind.
    pub fn supports_where(&self) -> bool {
        matches!(
            self,
            QueryKind::Select | QueryKind::Update | QueryKind::Delete
        )
    }

    /// Whether value assignments may be attached to this kind.
    pub fn supports_assignments(&self) -> bool {
        matches!(self, QueryKind::Insert | QueryKind::Update)
    }

    /// Whether a column projection set may be attached to this kind.
    pub fn supports_projection(&self) -> bool {
        matches!(self, QueryKind::Insert | QueryKind::Select)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable key/value pair used either as a WHERE predicate or as a
/// value-assignment directive.
///
/// Matching against cached rows is always exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    /// Column key the criterion applies to.
    pub key: String,
    /// The value to match or assign.
    pub value: String,
}

impl Criterion {
    /// Create a new criterion.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One field of a table schema as reported by store introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Column name.
    pub name: String,
    /// Whether the column is part of the primary key.
    pub is_primary: bool,
}

impl FieldInfo {
    /// Create a new field description.
    pub fn new(name: impl Into<String>, is_primary: bool) -> Self {
        Self {
            name: name.into(),
            is_primary,
        }
    }
}
