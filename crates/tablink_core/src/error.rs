//! Error types for the TabLink engine.

use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Column index is beyond the table's column count.
    #[error("column index {column} out of range (table has {count} columns)")]
    ColumnOutOfRange {
        /// The requested column.
        column: usize,
        /// Number of columns in the table.
        count: usize,
    },

    /// Row index is beyond the table's size.
    #[error("row index {row} out of range (table has {size} rows)")]
    RowOutOfRange {
        /// The requested row.
        row: usize,
        /// Number of rows in the table.
        size: usize,
    },

    /// Table id does not name a table in the group.
    #[error("no table with id {id}")]
    UnknownTable {
        /// The requested table id.
        id: u32,
    },

    /// No table with the given name.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// A table with the given name already exists.
    #[error("table already exists: {name}")]
    DuplicateTable {
        /// Name of the table.
        name: String,
    },

    /// Value kind does not match the column's declared kind.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Object type has no property with the given name.
    #[error("property not found: {object_type}.{name}")]
    PropertyNotFound {
        /// Object type searched.
        object_type: String,
        /// Property name.
        name: String,
    },

    /// Column is not a link or link-list column.
    #[error("column {column} is not a link column")]
    NotALink {
        /// The offending column.
        column: usize,
    },

    /// Mutation attempted through a read-only group or transaction.
    #[error("group is read-only")]
    ReadOnly,

    /// Another write transaction is already active.
    #[error("a write transaction is already in progress")]
    WriteInProgress,

    /// Group already holds the configured maximum number of tables.
    #[error("table limit reached ({limit})")]
    TooManyTables {
        /// The configured limit.
        limit: usize,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true if this error reports an index beyond bounds.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::ColumnOutOfRange { .. } | Self::RowOutOfRange { .. }
        )
    }
}
