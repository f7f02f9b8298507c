//! Error types for mirrorcache.

use std::io;
use thiserror::Error;

use crate::types::QueryKind;

/// Result type alias for mirrorcache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache and store operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Opening the backing-store connection failed.
    ///
    /// The cache stays uninitialized; callers may re-invoke `initialize`.
    #[error("connection to backing store failed: {0}")]
    ConnectionFailure(String),

    /// An operation required an open store connection and there was none.
    #[error("store connection is not open")]
    NotConnected,

    /// The backing store rejected a statement.
    #[error("store error: {0}")]
    Store(String),

    /// I/O error outside the store itself (e.g. spawning the writer thread).
    #[error("I/O error: {0}")]
    Io(String),

    /// A builder or execution method was called on an incompatible query kind.
    #[error("{op} is not valid for {kind} queries")]
    InvalidOperationForKind {
        /// The method that was invoked.
        op: &'static str,
        /// The kind it was invoked on.
        kind: QueryKind,
    },

    /// The named table is not in the cache registry.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The table was cleared; outstanding handles are stale.
    #[error("table `{0}` has been cleared")]
    TableCleared(String),

    /// Introspection reported more than one primary-key column.
    #[error("table `{0}` declares more than one primary column")]
    AmbiguousPrimaryColumn(String),

    /// A lifecycle operation ran before `initialize` succeeded.
    #[error("cache is not initialized")]
    NotInitialized,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An INSERT was built with no value assignments.
    #[error("INSERT into `{0}` has no value assignments")]
    EmptyInsert(String),

    /// An UPDATE was built with no value assignments.
    #[error("UPDATE has no value assignments")]
    EmptyUpdatePayload,

    /// A DIRECT query was executed without a raw statement.
    #[error("DIRECT query has no statement text")]
    MissingDirectCommand,

    /// The same parameter name would be bound twice in one statement.
    #[error("parameter `{0}` is bound more than once")]
    DuplicateParameter(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// Create a store error with the given message.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }

    /// Create a connection-failure error.
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::ConnectionFailure(msg.into())
    }

    /// Check if this error reports a builder/kind mismatch.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Error::InvalidOperationForKind { .. })
    }

    /// Check if this error means the cache handle is stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::TableCleared(_) | Error::UnknownTable(_))
    }

    /// Check if this error came from the store side rather than the cache.
    pub fn is_store_side(&self) -> bool {
        matches!(
            self,
            Error::ConnectionFailure(_) | Error::NotConnected | Error::Store(_)
        )
    }
}
