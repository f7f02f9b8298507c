//! In-memory rows.

use super::column::Schema;
use crate::types::{Criterion, RowMap};

/// One cached record: value slots parallel to the owning table's schema.
///
/// A row carries no reference back to its table; it is only meaningful
/// against the schema of the table that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<String>,
}

impl Row {
    /// Build a row from assignment directives.
    ///
    /// Directives naming no schema column are dropped. Columns absent from
    /// the directives are backfilled: the primary column gets
    /// `last_primary + 1`, every other column gets an empty value.
    pub(crate) fn from_directives(
        schema: &Schema,
        directives: &[Criterion],
        last_primary: i64,
    ) -> Self {
        let mut values = vec![String::new(); schema.len()];
        let mut supplied = vec![false; schema.len()];
        for directive in directives {
            if let Some(i) = schema.index_of(&directive.key) {
                values[i] = directive.value.clone();
                supplied[i] = true;
            }
        }
        if let Some(p) = schema.primary_index() {
            if !supplied[p] {
                values[p] = (last_primary + 1).to_string();
            }
        }
        Self { values }
    }

    /// Value in the given slot.
    pub(crate) fn get(&self, index: usize) -> &str {
        &self.values[index]
    }

    /// Overwrite the value in the given slot.
    pub(crate) fn set(&mut self, index: usize, value: String) {
        self.values[index] = value;
    }

    /// Whether this row matches every criterion, by exact string equality.
    ///
    /// A criterion naming no schema column matches nothing.
    pub(crate) fn matches(&self, schema: &Schema, criteria: &[Criterion]) -> bool {
        criteria.iter().all(|criterion| {
            schema
                .index_of(&criterion.key)
                .map(|i| self.values[i] == criterion.value)
                .unwrap_or(false)
        })
    }

    /// Fresh key-to-value copy of this row.
    pub(crate) fn as_map(&self, schema: &Schema) -> RowMap {
        schema
            .columns()
            .iter()
            .zip(&self.values)
            .map(|(column, value)| (column.key().to_string(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldInfo;

    fn schema() -> Schema {
        Schema::from_fields(
            "users",
            &[
                FieldInfo::new("id", true),
                FieldInfo::new("username", false),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_backfills_primary_and_blanks() {
        let row = Row::from_directives(&schema(), &[Criterion::new("username", "alice")], 0);
        assert_eq!(row.get(0), "1");
        assert_eq!(row.get(1), "alice");

        let row = Row::from_directives(&schema(), &[], 41);
        assert_eq!(row.get(0), "42");
        assert_eq!(row.get(1), "");
    }

    #[test]
    fn test_row_keeps_supplied_primary() {
        let directives = [Criterion::new("id", "7"), Criterion::new("username", "bob")];
        let row = Row::from_directives(&schema(), &directives, 2);
        assert_eq!(row.get(0), "7");
    }

    #[test]
    fn test_row_drops_unknown_directive_keys() {
        let directives = [
            Criterion::new("username", "carol"),
            Criterion::new("nonsense", "x"),
        ];
        let row = Row::from_directives(&schema(), &directives, 0);
        assert_eq!(row.as_map(&schema()).len(), 2);
    }

    #[test]
    fn test_row_matching_is_conjunctive_exact() {
        let schema = schema();
        let row = Row::from_directives(&schema, &[Criterion::new("username", "alice")], 0);

        assert!(row.matches(&schema, &[]));
        assert!(row.matches(&schema, &[Criterion::new("username", "alice")]));
        assert!(row.matches(
            &schema,
            &[Criterion::new("id", "1"), Criterion::new("username", "alice")]
        ));
        // One mismatching criterion fails the whole conjunction.
        assert!(!row.matches(
            &schema,
            &[Criterion::new("id", "1"), Criterion::new("username", "bob")]
        ));
        // Unknown key never matches.
        assert!(!row.matches(&schema, &[Criterion::new("missing", "1")]));
        // Exact string equality, no numeric coercion.
        assert!(!row.matches(&schema, &[Criterion::new("id", "01")]));
    }
}
