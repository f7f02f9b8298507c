//! Column descriptors and table schemas.

use crate::types::FieldInfo;
use crate::{Error, Result};

/// Immutable descriptor of one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    key: String,
    is_primary: bool,
}

impl Column {
    /// Create a new column descriptor.
    pub fn new(key: impl Into<String>, is_primary: bool) -> Self {
        Self {
            key: key.into(),
            is_primary,
        }
    }

    /// Column key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this is the primary-key column.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

/// Ordered column set of one table, fixed at load time.
///
/// Values never live here; rows hold them in slots parallel to this order.
#[derive(Debug, Clone)]
pub(crate) struct Schema {
    columns: Vec<Column>,
    primary: Option<usize>,
}

impl Schema {
    /// Build a schema from introspected fields.
    ///
    /// At most one field may be flagged primary; composite keys are not
    /// supported and are rejected with `AmbiguousPrimaryColumn`.
    pub(crate) fn from_fields(table: &str, fields: &[FieldInfo]) -> Result<Self> {
        let mut columns = Vec::with_capacity(fields.len());
        let mut primary = None;
        for (i, field) in fields.iter().enumerate() {
            if field.is_primary {
                if primary.is_some() {
                    return Err(Error::AmbiguousPrimaryColumn(table.to_string()));
                }
                primary = Some(i);
            }
            columns.push(Column::new(&field.name, field.is_primary));
        }
        Ok(Self { columns, primary })
    }

    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Slot index of the primary column, if the table has one.
    pub(crate) fn primary_index(&self) -> Option<usize> {
        self.primary
    }

    /// Slot index of the named column.
    pub(crate) fn index_of(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key() == key)
    }

    pub(crate) fn len(&self) -> usize {
        self.columns.len()
    }
}
