//! Group configuration.

/// Configuration for opening a shared group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether write transactions are refused.
    pub read_only: bool,

    /// Maximum number of tables a group may hold.
    pub max_tables: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: false,
            max_tables: 1024,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the group refuses write transactions.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets the maximum number of tables.
    #[must_use]
    pub const fn max_tables(mut self, limit: usize) -> Self {
        self.max_tables = limit;
        self
    }
}
