//! Parameterized statement generation.
//!
//! Values never appear in statement text; they travel as named parameters
//! bound by the driver. Only identifiers (table and column names, which
//! come from code, not user input) are spliced into the text.

use std::fmt;

use super::Query;
use crate::types::{Criterion, QueryKind};
use crate::{Error, Result};

/// A statement ready for the store: text plus named parameter bindings.
///
/// Parameter names are stored without the `:` prefix; drivers add their
/// own placeholder syntax when binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text with `:name` placeholders.
    pub text: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<(String, String)>,
}

impl Statement {
    /// A statement with no bound parameters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    /// A statement with bound parameters.
    pub fn with_params(text: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Query {
    /// Generate the parameterized statement for this request.
    pub fn statement(&self) -> Result<Statement> {
        match self.kind() {
            QueryKind::Direct => self
                .direct_text()
                .map(Statement::new)
                .ok_or(Error::MissingDirectCommand),
            QueryKind::Select => {
                let columns = if self.filters().is_empty() {
                    "*".to_string()
                } else {
                    self.filters().join(", ")
                };
                let mut text = format!("SELECT {} FROM {}", columns, self.table());
                let mut params = Vec::new();
                self.append_where(&mut text, &mut params)?;
                Ok(Statement::with_params(text, params))
            }
            QueryKind::Insert => {
                if self.assignments().is_empty() {
                    return Err(Error::EmptyInsert(self.table().to_string()));
                }
                // Explicit column list: the projection set when given,
                // otherwise the assignment keys in insertion order.
                let columns: Vec<&str> = if self.filters().is_empty() {
                    self.assignments().iter().map(|c| c.key.as_str()).collect()
                } else {
                    self.filters().iter().map(String::as_str).collect()
                };
                let placeholders: Vec<String> = self
                    .assignments()
                    .iter()
                    .map(|c| format!(":{}", c.key))
                    .collect();
                let text = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    self.table(),
                    columns.join(", "),
                    placeholders.join(", ")
                );
                let mut params = Vec::new();
                for criterion in self.assignments() {
                    push_param(&mut params, criterion)?;
                }
                Ok(Statement::with_params(text, params))
            }
            QueryKind::Update => {
                if self.assignments().is_empty() {
                    return Err(Error::EmptyUpdatePayload);
                }
                let assignments: Vec<String> = self
                    .assignments()
                    .iter()
                    .map(|c| format!("{} = :{}", c.key, c.key))
                    .collect();
                let mut text = format!("UPDATE {} SET {}", self.table(), assignments.join(", "));
                let mut params = Vec::new();
                for criterion in self.assignments() {
                    push_param(&mut params, criterion)?;
                }
                self.append_where(&mut text, &mut params)?;
                Ok(Statement::with_params(text, params))
            }
            QueryKind::Delete => {
                let mut text = format!("DELETE FROM {}", self.table());
                let mut params = Vec::new();
                self.append_where(&mut text, &mut params)?;
                Ok(Statement::with_params(text, params))
            }
        }
    }

    /// Append `WHERE a = :a AND b = :b` when any predicates exist.
    fn append_where(&self, text: &mut String, params: &mut Vec<(String, String)>) -> Result<()> {
        if self.predicates().is_empty() {
            return Ok(());
        }
        let clause: Vec<String> = self
            .predicates()
            .iter()
            .map(|c| format!("{} = :{}", c.key, c.key))
            .collect();
        text.push_str(" WHERE ");
        text.push_str(&clause.join(" AND "));
        for criterion in self.predicates() {
            push_param(params, criterion)?;
        }
        Ok(())
    }
}

/// Bind one parameter, rejecting a name that is already bound.
fn push_param(params: &mut Vec<(String, String)>, criterion: &Criterion) -> Result<()> {
    if params.iter().any(|(key, _)| key == &criterion.key) {
        return Err(Error::DuplicateParameter(criterion.key.clone()));
    }
    params.push((criterion.key.clone(), criterion.value.clone()));
    Ok(())
}
