//! Configuration options for mirrorcache.

use std::time::Duration;

/// How store-bound mutation statements are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Execute on the caller's thread; store errors propagate to the caller.
    #[default]
    Blocking,
    /// Enqueue to a background writer thread and return immediately.
    ///
    /// Store failures are logged and counted, never raised to the caller;
    /// the cache and the store can transiently diverge until the write
    /// lands. Cache mutation itself is always synchronous.
    FireAndForget,
}

impl WriteMode {
    /// Check if store writes block the caller.
    pub fn is_blocking(&self) -> bool {
        matches!(self, WriteMode::Blocking)
    }
}

/// Cache configuration options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Tables to mirror, in warm-up order.
    pub tables: Vec<String>,

    /// Load every configured table during `initialize`.
    ///
    /// When false, the cache connects but stays cold until `start_up`.
    pub optimize: bool,

    /// How mutation statements reach the store.
    pub write_mode: WriteMode,

    /// Deadline applied to store calls, where the driver supports one.
    ///
    /// The SQLite driver maps this to its busy timeout.
    pub store_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            optimize: true,
            write_mode: WriteMode::default(),
            store_timeout: None,
        }
    }
}

impl Options {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Validate the options.
    pub fn validate(&self) -> crate::Result<()> {
        for (i, name) in self.tables.iter().enumerate() {
            if name.is_empty() {
                return Err(crate::Error::InvalidConfiguration(
                    "table names must not be empty".into(),
                ));
            }
            if self.tables[..i].contains(name) {
                return Err(crate::Error::InvalidConfiguration(format!(
                    "table `{}` is configured more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for Options.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full table list, replacing any previously added names.
    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Append one table to the warm-up list.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.options.tables.push(name.into());
        self
    }

    /// Set whether warm-up runs during `initialize`.
    pub fn optimize(mut self, value: bool) -> Self {
        self.options.optimize = value;
        self
    }

    /// Set the write mode for store-bound mutations.
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.options.write_mode = mode;
        self
    }

    /// Set the store-call deadline.
    pub fn store_timeout(mut self, timeout: Duration) -> Self {
        self.options.store_timeout = Some(timeout);
        self
    }

    /// Build the options.
    pub fn build(self) -> crate::Result<Options> {
        self.options.validate()?;
        Ok(self.options)
    }
}
