//! # mirrorcache
//!
//! A write-through in-memory cache that mirrors a relational backing store.
//!
//! ## Features
//!
//! - **Mirrored tables**: schema and rows of configured store tables are
//!   loaded into memory once, then kept in step with every write
//! - **Write-through**: mutations hit the mirror synchronously and are
//!   forwarded to the store, blocking or fire-and-forget
//! - **Cache-served reads**: selects bypass the store entirely while the
//!   cache is warmed up; per-request opt-out with `bypass_cache`
//! - **Parameterized statements**: generated SQL always binds values as
//!   named parameters, never splices them into text
//! - **Pluggable store**: drivers implement the `StoreDriver` trait; a
//!   SQLite driver ships in the box
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mirrorcache::{Cache, Options, Query, SqliteDriver};
//!
//! let driver = Arc::new(SqliteDriver::new("./app.db"));
//! let options = Options::builder().tables(["users", "books"]).build()?;
//! let cache = Cache::new(options, driver)?;
//!
//! // Connect and load every configured table.
//! cache.initialize()?;
//!
//! // Writes go to both the mirror and the store.
//! let id = Query::insert("users")
//!     .set("username", "alice")?
//!     .apply_returning_id(&cache)?;
//!
//! // Reads are served from memory.
//! let row = Query::select("users")
//!     .where_eq("id", id.to_string())?
//!     .fetch_one(&cache)?;
//! ```

// Public modules
pub mod error;
pub mod options;
pub mod types;

// Internal modules
mod cache;
mod query;
mod store;
mod table;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use options::{Options, OptionsBuilder, WriteMode};
pub use types::{Criterion, FieldInfo, QueryKind, RowMap};

// Cache manager
pub use cache::{Cache, CacheState, CacheStats};

// Queries
pub use query::{Query, Statement};

// Store drivers
pub use store::{SqliteDriver, StoreDriver};

// Tables
pub use table::{Column, Table};
