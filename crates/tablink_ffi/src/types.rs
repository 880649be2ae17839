//! Type definitions for FFI.

use tablink_core::Config;

/// Configuration for opening a group.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct TlConfig {
    /// Refuse write transactions.
    pub read_only: bool,
    /// Maximum number of tables; zero means the engine default.
    pub max_tables: u64,
}

impl Default for TlConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            max_tables: 0,
        }
    }
}

impl TlConfig {
    /// Converts to the engine configuration.
    pub fn to_config(&self) -> Config {
        let config = Config::new().read_only(self.read_only);
        match usize::try_from(self.max_tables) {
            Ok(0) => config,
            Ok(limit) => config.max_tables(limit),
            Err(_) => config.max_tables(usize::MAX),
        }
    }
}
