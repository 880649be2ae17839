//! # TabLink Core
//!
//! In-memory, column-oriented reference engine for TabLink.
//!
//! This crate provides:
//! - Typed column storage with link and link-list columns between tables
//! - A table group with name to object-type lookup
//! - Snapshot transactions with a single writer
//!
//! It is not durable. The query layer (`tablink_query`) consumes it only
//! through the [`TableSource`] and [`ObjectStore`] traits.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod group;
mod schema;
mod table;
mod transaction;
mod types;
mod value;

pub use config::Config;
pub use error::{CoreError, CoreResult};
pub use group::Group;
pub use schema::{
    object_type_for_table_name, table_name_for_object_type, ObjectStore, Property, PropertyPath,
};
pub use table::{ColumnSpec, Table, TableSource};
pub use transaction::{ReadTransaction, SharedGroup, TransactionState, WriteTransaction};
pub use types::{DataKind, TableId, NOT_FOUND};
pub use value::{Timestamp, Value};
