//! Error codes and result types.
//!
//! Failure codes are negative so they can share an `isize` channel with
//! booleans and sizes.

use crate::text::TextError;
use std::cell::RefCell;
use std::ffi::CString;
use tablink_core::CoreError;
use tablink_query::QueryError;
use thiserror::Error;
use tracing::debug;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlResult {
    /// Operation succeeded.
    Ok = 0,
    /// Text is not valid UTF-16 or UTF-8.
    InvalidEncoding = -1,
    /// Operator, operand or accessor does not fit the column's kind.
    TypeMismatch = -2,
    /// Column, row or view index beyond bounds.
    OutOfRange = -3,
    /// Link-chain hop is not a relationship column.
    InvalidLink = -4,
    /// Connectives do not form a valid expression.
    MalformedExpression = -5,
    /// Operation not permitted in the current state.
    InvalidState = -6,
    /// Engine failure.
    StorageFailure = -7,
    /// Unknown, destroyed or wrong-type handle.
    InvalidHandle = -8,
    /// Null pointer where data was required.
    NullPointer = -9,
    /// Mutation through a read-only handle.
    ReadOnly = -10,
}

impl TlResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == TlResult::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != TlResult::Ok
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<TlResult> for ErrorCode {
    fn from(result: TlResult) -> Self {
        result as ErrorCode
    }
}

impl From<ErrorCode> for TlResult {
    fn from(code: ErrorCode) -> Self {
        match code {
            0 => TlResult::Ok,
            -1 => TlResult::InvalidEncoding,
            -2 => TlResult::TypeMismatch,
            -3 => TlResult::OutOfRange,
            -4 => TlResult::InvalidLink,
            -5 => TlResult::MalformedExpression,
            -6 => TlResult::InvalidState,
            -8 => TlResult::InvalidHandle,
            -9 => TlResult::NullPointer,
            -10 => TlResult::ReadOnly,
            _ => TlResult::StorageFailure,
        }
    }
}

impl From<&CoreError> for TlResult {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ColumnOutOfRange { .. }
            | CoreError::RowOutOfRange { .. }
            | CoreError::UnknownTable { .. }
            | CoreError::TableNotFound { .. } => TlResult::OutOfRange,
            CoreError::TypeMismatch { .. } => TlResult::TypeMismatch,
            CoreError::NotALink { .. } => TlResult::InvalidLink,
            CoreError::ReadOnly => TlResult::ReadOnly,
            _ => TlResult::StorageFailure,
        }
    }
}

impl From<&QueryError> for TlResult {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::TypeMismatch { .. } => TlResult::TypeMismatch,
            QueryError::OutOfRange { .. } => TlResult::OutOfRange,
            QueryError::InvalidLink { .. } => TlResult::InvalidLink,
            QueryError::MalformedExpression { .. } => TlResult::MalformedExpression,
            QueryError::InvalidState { .. } => TlResult::InvalidState,
            QueryError::Storage(core) => core.into(),
        }
    }
}

/// Result type for boundary operations.
pub type FfiResult<T> = Result<T, FfiError>;

/// Errors raised while serving a boundary call.
#[derive(Debug, Error)]
pub enum FfiError {
    /// Engine error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Query error.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Text argument could not be decoded.
    #[error("invalid text argument: {0}")]
    Text(#[from] TextError),

    /// Handle is unknown, destroyed, or of another type.
    #[error("invalid handle {handle:#x}: expected {expected}")]
    InvalidHandle {
        /// The offending handle.
        handle: u64,
        /// What the call needed.
        expected: &'static str,
    },

    /// Null pointer argument.
    #[error("null pointer argument: {0}")]
    NullPointer(&'static str),

    /// Mutation through a read-only handle.
    #[error("handle is read-only: {0}")]
    ReadOnly(&'static str),

    /// Call not valid in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unknown enum code.
    #[error("unknown {what} code {code}")]
    UnknownCode {
        /// Which enumeration.
        what: &'static str,
        /// The code received.
        code: u32,
    },

    /// A panic was caught at the boundary.
    #[error("internal error: {0}")]
    Panic(String),
}

impl FfiError {
    /// Creates an invalid handle error.
    pub fn invalid_handle(handle: u64, expected: &'static str) -> Self {
        Self::InvalidHandle { handle, expected }
    }

    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Returns the result code reported for this error.
    pub fn code(&self) -> TlResult {
        match self {
            Self::Core(err) => err.into(),
            Self::Query(err) => err.into(),
            Self::Text(_) => TlResult::InvalidEncoding,
            Self::InvalidHandle { .. } => TlResult::InvalidHandle,
            Self::NullPointer(_) => TlResult::NullPointer,
            Self::ReadOnly(_) => TlResult::ReadOnly,
            Self::InvalidState(_) => TlResult::InvalidState,
            Self::UnknownCode { .. } => TlResult::TypeMismatch,
            Self::Panic(_) => TlResult::StorageFailure,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Records `err` as the last error and returns its code.
pub fn report(err: &FfiError) -> TlResult {
    let code = err.code();
    debug!(?code, error = %err, "boundary call failed");
    set_last_error(err.to_string());
    code
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn tl_get_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn tl_clear_error() {
    clear_last_error();
}
