//! # TabLink Query
//!
//! Predicate composition and evaluation over TabLink tables.
//!
//! This crate provides:
//! - Typed atomic predicates validated against the column's kind
//! - Link-chain resolution for predicates on related tables
//! - AND/OR/NOT and grouping composition into a sealed filter
//! - Materialization to rows, counts, sorted views and aggregates
//!
//! ## Example
//!
//! ```rust,ignore
//! use tablink_query::{CompareOp, Query, Range};
//!
//! let mut query = Query::new(people);
//! query.compare(&group, age, CompareOp::Equal, Value::Int(30), true)?;
//! let view = query.find_all(&group, Range::ALL)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod expr;
mod link;
mod materialize;
mod predicate;
mod query;
mod sort;
mod view;

pub use error::{QueryError, QueryResult};
pub use expr::Expr;
pub use link::LinkChain;
pub use materialize::{Aggregate, Range};
pub use predicate::{supports, AtomicPredicate, ColumnRef, CompareOp, Condition, PredicateBuilder};
pub use query::{Query, QueryState};
pub use sort::{SortClause, SortDescriptor};
pub use view::TableView;
