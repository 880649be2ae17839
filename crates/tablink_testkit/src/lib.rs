//! # TabLink Testkit
//!
//! Test utilities for TabLink.
//!
//! This crate provides:
//! - Fixture groups: the people table, owners and dogs, the item chain
//! - Property-based test generators using proptest
//! - Cross-language text codec vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tablink_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_people() {
//!     let people = People::new();
//!     assert_eq!(people.group.table(people.table).unwrap().size(), 3);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
