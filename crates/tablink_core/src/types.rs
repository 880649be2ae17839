//! Core type definitions for TabLink.

use std::fmt;

/// Sentinel row index meaning "no row".
pub const NOT_FOUND: usize = usize::MAX;

/// Identifier for a table within a group.
///
/// Table ids are assigned in creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

impl TableId {
    /// Creates a new table id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tbl:{}", self.0)
    }
}

/// Declared data kind of a column.
///
/// The discriminants are the codes exchanged across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataKind {
    /// 64-bit signed integer.
    Integer = 0,
    /// Boolean.
    Boolean = 1,
    /// UTF-8 string.
    String = 2,
    /// Opaque bytes.
    Binary = 4,
    /// Nested table.
    Table = 5,
    /// Any scalar value.
    Mixed = 6,
    /// Point in time with nanosecond precision.
    Timestamp = 8,
    /// 32-bit float.
    Float = 9,
    /// 64-bit float.
    Double = 10,
    /// Reference to one row of another table.
    Link = 12,
    /// Ordered references to rows of another table.
    LinkList = 13,
}

impl DataKind {
    /// Decodes a boundary kind code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Integer,
            1 => Self::Boolean,
            2 => Self::String,
            4 => Self::Binary,
            5 => Self::Table,
            6 => Self::Mixed,
            8 => Self::Timestamp,
            9 => Self::Float,
            10 => Self::Double,
            12 => Self::Link,
            13 => Self::LinkList,
            _ => return None,
        })
    }

    /// Returns the boundary kind code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Returns true for link and link-list kinds.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Link | Self::LinkList)
    }

    /// Returns true for kinds that support arithmetic aggregates.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Double)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "int",
            Self::Boolean => "bool",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Table => "table",
            Self::Mixed => "mixed",
            Self::Timestamp => "timestamp",
            Self::Float => "float",
            Self::Double => "double",
            Self::Link => "link",
            Self::LinkList => "linklist",
        };
        f.write_str(name)
    }
}
