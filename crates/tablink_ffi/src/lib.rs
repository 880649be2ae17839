//! # TabLink FFI
//!
//! Flat C ABI for driving TabLink from a managed runtime.
//!
//! This crate provides:
//! - UTF-16 caller buffers to and from UTF-8 engine strings
//! - Tri-state (true, false, error) results on one integer channel
//! - Opaque `u64` handles for groups, tables, queries and views
//! - Result codes plus a thread-local last-error message
//!
//! ## Conventions
//!
//! Every exported function clears the last error on entry. Functions return
//! [`TlResult`] and write results through out-pointers, or return an `isize`
//! where negative values are [`TlResult`] codes. Text arguments are
//! `(*const u16, len)` pairs; text results use the size-negotiating protocol
//! in [`text`]. Engine-allocated byte buffers are released with
//! [`tl_buffer_free`].

#![warn(missing_docs)]

pub mod buffer;
mod call;
pub mod error;
pub mod group;
pub mod handles;
pub mod query;
pub mod signal;
pub mod table;
pub mod text;
pub mod types;
pub mod view;

pub use buffer::{tl_buffer_free, TlBuffer};
pub use error::{tl_clear_error, tl_get_last_error, FfiError, FfiResult, TlResult};
pub use handles::{Handle, NULL_HANDLE};
pub use types::TlConfig;
