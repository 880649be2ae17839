//! Error types for query building and evaluation.

use tablink_core::CoreError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while building or evaluating a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Operator or operand does not fit the column's kind.
    #[error("type mismatch: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Column or row index beyond bounds.
    #[error("out of range: {message}")]
    OutOfRange {
        /// Description of the bound that was exceeded.
        message: String,
    },

    /// A link-chain hop is not a relationship column or is out of range.
    #[error("invalid link: {message}")]
    InvalidLink {
        /// Description of the bad hop.
        message: String,
    },

    /// Connectives do not form a valid expression.
    #[error("malformed expression: {message}")]
    MalformedExpression {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in the query's current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// Failure reported by the engine.
    #[error("storage failure: {0}")]
    Storage(CoreError),
}

impl QueryError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// Creates an out of range error.
    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::OutOfRange {
            message: message.into(),
        }
    }

    /// Creates an invalid link error.
    pub fn invalid_link(message: impl Into<String>) -> Self {
        Self::InvalidLink {
            message: message.into(),
        }
    }

    /// Creates a malformed expression error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

impl From<CoreError> for QueryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ColumnOutOfRange { .. } | CoreError::RowOutOfRange { .. } => {
                Self::out_of_range(err.to_string())
            }
            CoreError::TypeMismatch { message } => Self::TypeMismatch { message },
            CoreError::NotALink { .. } => Self::invalid_link(err.to_string()),
            other => Self::Storage(other),
        }
    }
}
