//! Cell values.

use crate::types::DataKind;
use std::cmp::Ordering;
use std::fmt;

/// 100-nanosecond ticks per second.
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks between 0001-01-01T00:00:00Z and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Point in time relative to the Unix epoch.
///
/// `nanoseconds` always carries the same sign as `seconds` (or is zero), so
/// the derived ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second part in nanoseconds.
    pub nanoseconds: i32,
}

impl Timestamp {
    /// Creates a timestamp.
    #[must_use]
    pub const fn new(seconds: i64, nanoseconds: i32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Converts from ticks (100 ns units since 0001-01-01).
    #[must_use]
    pub fn from_ticks(ticks: i64) -> Self {
        let unix_ticks = ticks.saturating_sub(UNIX_EPOCH_TICKS);
        Self {
            seconds: unix_ticks / TICKS_PER_SECOND,
            nanoseconds: ((unix_ticks % TICKS_PER_SECOND) * 100) as i32,
        }
    }

    /// Converts to ticks (100 ns units since 0001-01-01).
    #[must_use]
    pub fn to_ticks(self) -> i64 {
        self.seconds
            .saturating_mul(TICKS_PER_SECOND)
            .saturating_add(i64::from(self.nanoseconds / 100))
            .saturating_add(UNIX_EPOCH_TICKS)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value (also a null link).
    Null,
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// UTF-8 text.
    String(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// Point in time.
    Timestamp(Timestamp),
    /// Row index in the link column's target table.
    Link(usize),
    /// Row indices in the link-list column's target table.
    LinkList(Vec<usize>),
}

impl Value {
    /// Returns the kind this value carries, or `None` for null.
    #[must_use]
    pub fn kind(&self) -> Option<DataKind> {
        Some(match self {
            Self::Null => return None,
            Self::Int(_) => DataKind::Integer,
            Self::Bool(_) => DataKind::Boolean,
            Self::Float(_) => DataKind::Float,
            Self::Double(_) => DataKind::Double,
            Self::String(_) => DataKind::String,
            Self::Binary(_) => DataKind::Binary,
            Self::Timestamp(_) => DataKind::Timestamp,
            Self::Link(_) => DataKind::Link,
            Self::LinkList(_) => DataKind::LinkList,
        })
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Default value stored in a fresh row of a non-nullable column.
    #[must_use]
    pub fn default_for(kind: DataKind) -> Self {
        match kind {
            DataKind::Integer | DataKind::Mixed => Self::Int(0),
            DataKind::Boolean => Self::Bool(false),
            DataKind::Float => Self::Float(0.0),
            DataKind::Double => Self::Double(0.0),
            DataKind::String => Self::String(String::new()),
            DataKind::Binary => Self::Binary(Vec::new()),
            DataKind::Timestamp => Self::Timestamp(Timestamp::default()),
            DataKind::LinkList => Self::LinkList(Vec::new()),
            DataKind::Link | DataKind::Table => Self::Null,
        }
    }

    /// Returns true if this non-null value may be stored in a column of `kind`.
    #[must_use]
    pub fn fits(&self, kind: DataKind) -> bool {
        match (self.kind(), kind) {
            (None, _) => true,
            (Some(DataKind::Link | DataKind::LinkList), DataKind::Mixed) => false,
            (Some(_), DataKind::Mixed) => true,
            (Some(own), declared) => own == declared,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Compares two values of compatible kinds.
    ///
    /// Numeric kinds compare with each other; every other kind only compares
    /// with itself. Null compares equal to null and is incomparable otherwise.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Link(a), Self::Link(b)) => Some(a.cmp(b)),
            (Self::LinkList(a), Self::LinkList(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Self::Timestamp(t) => write!(f, "{}.{:09}", t.seconds, t.nanoseconds.unsigned_abs()),
            Self::Link(row) => write!(f, "->{row}"),
            Self::LinkList(rows) => write!(f, "->{rows:?}"),
        }
    }
}
