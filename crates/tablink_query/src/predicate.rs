//! Atomic predicates against one column.
//!
//! Validation of operator against column kind goes through [`supports`],
//! a single (operator class × kind) table.

use crate::error::{QueryError, QueryResult};
use crate::link::LinkChain;
use std::cmp::Ordering;
use std::fmt;
use tablink_core::{DataKind, Table, TableId, TableSource, Value};

/// Comparison operator.
///
/// The discriminants are the codes exchanged across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CompareOp {
    /// `==`
    Equal = 1,
    /// `!=`
    NotEqual = 2,
    /// `<`
    LessThan = 3,
    /// `<=`
    LessOrEqual = 4,
    /// `>`
    GreaterThan = 5,
    /// `>=`
    GreaterOrEqual = 6,
    /// String prefix match.
    BeginsWith = 7,
    /// String suffix match.
    EndsWith = 8,
    /// Substring match.
    Contains = 9,
    /// Wildcard match: `*` any run, `?` one character.
    Like = 10,
}

/// Operator families that share kind support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpClass {
    Equality,
    Ordering,
    TextMatch,
}

impl CompareOp {
    /// Decodes a boundary operator code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => Self::Equal,
            2 => Self::NotEqual,
            3 => Self::LessThan,
            4 => Self::LessOrEqual,
            5 => Self::GreaterThan,
            6 => Self::GreaterOrEqual,
            7 => Self::BeginsWith,
            8 => Self::EndsWith,
            9 => Self::Contains,
            10 => Self::Like,
            _ => return None,
        })
    }

    const fn class(self) -> OpClass {
        match self {
            Self::Equal | Self::NotEqual => OpClass::Equality,
            Self::LessThan | Self::LessOrEqual | Self::GreaterThan | Self::GreaterOrEqual => {
                OpClass::Ordering
            }
            Self::BeginsWith | Self::EndsWith | Self::Contains | Self::Like => OpClass::TextMatch,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
            Self::LessThan => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::BeginsWith | Self::EndsWith | Self::Contains | Self::Like => false,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::BeginsWith => "BEGINSWITH",
            Self::EndsWith => "ENDSWITH",
            Self::Contains => "CONTAINS",
            Self::Like => "LIKE",
        };
        f.write_str(symbol)
    }
}

/// Returns true if `op` is defined for columns of `kind`.
#[must_use]
pub const fn supports(op: CompareOp, kind: DataKind) -> bool {
    use DataKind as K;
    match (op.class(), kind) {
        (
            OpClass::Equality | OpClass::Ordering,
            K::Integer | K::Float | K::Double | K::Timestamp,
        ) => true,
        (OpClass::Equality, K::Boolean | K::String | K::Binary | K::Link) => true,
        (OpClass::TextMatch, K::String) => true,
        (OpClass::Ordering, K::Boolean | K::String | K::Binary | K::Link) => false,
        (OpClass::TextMatch, _) => false,
        (_, K::LinkList | K::Mixed | K::Table) => false,
    }
}

/// The test a predicate applies to one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Compare against an operand.
    Compare {
        /// Operator.
        op: CompareOp,
        /// Operand of the column's kind.
        operand: Value,
        /// Case sensitivity for string operators.
        case_sensitive: bool,
    },
    /// Inclusive integer range.
    Between {
        /// Lower bound.
        low: i64,
        /// Upper bound.
        high: i64,
    },
    /// Cell is null.
    IsNull,
    /// Cell is not null.
    IsNotNull,
}

/// A resolved column: the table it lives in and its declared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    /// Table holding the column.
    pub table: TableId,
    /// Column index.
    pub column: usize,
    /// Declared kind.
    pub kind: DataKind,
}

impl ColumnRef {
    /// Looks up a column, failing with `OutOfRange` past the column count.
    pub fn resolve(source: &dyn TableSource, table: TableId, column: usize) -> QueryResult<Self> {
        let kind = source.table(table)?.column_kind(column)?;
        Ok(Self {
            table,
            column,
            kind,
        })
    }
}

/// A single immutable test against one column, possibly reached through links.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicPredicate {
    base: TableId,
    chain: LinkChain,
    target: ColumnRef,
    condition: Condition,
}

impl AtomicPredicate {
    /// Returns the base table rows are drawn from.
    #[must_use]
    pub fn base(&self) -> TableId {
        self.base
    }

    /// Returns the link chain followed from the base table.
    #[must_use]
    pub fn chain(&self) -> &LinkChain {
        &self.chain
    }

    /// Returns the tested column.
    #[must_use]
    pub fn target(&self) -> ColumnRef {
        self.target
    }

    /// Returns the condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Evaluates the predicate for one base-table row.
    pub fn evaluate(&self, source: &dyn TableSource, row: usize) -> QueryResult<bool> {
        let ColumnRef { column, .. } = self.target;
        let condition = &self.condition;
        self.chain
            .any_reachable(source, self.base, row, &mut |table: &Table, r| {
                Ok(condition.matches(table.get(column, r)?))
            })
    }
}

impl Condition {
    /// Applies the condition to a cell value.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::IsNull => value.is_null(),
            Self::IsNotNull => !value.is_null(),
            Self::Between { low, high } => {
                matches!(value, Value::Int(v) if (*low..=*high).contains(v))
            }
            Self::Compare {
                op,
                operand,
                case_sensitive,
            } => compare(*op, value, operand, *case_sensitive),
        }
    }
}

fn compare(op: CompareOp, value: &Value, operand: &Value, case_sensitive: bool) -> bool {
    if value.is_null() {
        return op == CompareOp::NotEqual;
    }
    match (op.class(), value, operand) {
        (OpClass::TextMatch, Value::String(text), Value::String(pattern)) => {
            text_match(op, text, pattern, case_sensitive)
        }
        (_, Value::String(a), Value::String(b)) if !case_sensitive => {
            op.holds(a.to_lowercase().cmp(&b.to_lowercase()))
        }
        _ => value.compare(operand).is_some_and(|ordering| op.holds(ordering)),
    }
}

fn text_match(op: CompareOp, text: &str, pattern: &str, case_sensitive: bool) -> bool {
    let (text, pattern) = if case_sensitive {
        (text.to_owned(), pattern.to_owned())
    } else {
        (text.to_lowercase(), pattern.to_lowercase())
    };
    match op {
        CompareOp::BeginsWith => text.starts_with(&pattern),
        CompareOp::EndsWith => text.ends_with(&pattern),
        CompareOp::Contains => text.contains(&pattern),
        CompareOp::Like => like(&text, &pattern),
        _ => false,
    }
}

/// Wildcard match with `*` and `?`, backtracking to the last star.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Builds predicates against a base table, optionally through a link chain.
pub struct PredicateBuilder<'a> {
    source: &'a dyn TableSource,
    base: TableId,
    chain: LinkChain,
}

impl<'a> PredicateBuilder<'a> {
    /// Creates a builder for local columns of `base`.
    pub fn new(source: &'a dyn TableSource, base: TableId) -> Self {
        Self {
            source,
            base,
            chain: LinkChain::local(),
        }
    }

    /// Redirects predicates to the table reached through `chain`.
    #[must_use]
    pub fn through(mut self, chain: LinkChain) -> Self {
        self.chain = chain;
        self
    }

    /// Builds a comparison predicate.
    ///
    /// String and binary comparisons honour `case_sensitive`; other kinds
    /// ignore it. Binary columns only compare case-sensitively.
    pub fn compare(
        &self,
        column: usize,
        op: CompareOp,
        operand: Value,
        case_sensitive: bool,
    ) -> QueryResult<AtomicPredicate> {
        let target = self.column(column)?;
        if !supports(op, target.kind) {
            return Err(QueryError::type_mismatch(format!(
                "operator {op} is not defined for {} columns",
                target.kind
            )));
        }
        let operand_kind = operand
            .kind()
            .ok_or_else(|| QueryError::type_mismatch("use a null predicate to compare with null"))?;
        if operand_kind != target.kind {
            return Err(QueryError::type_mismatch(format!(
                "{operand_kind} operand for {} column {column}",
                target.kind
            )));
        }
        if target.kind == DataKind::Binary && !case_sensitive {
            return Err(QueryError::type_mismatch(
                "binary comparisons are always case sensitive",
            ));
        }
        if let (DataKind::Link, Value::Link(row)) = (target.kind, &operand) {
            let size = self.source.table(self.link_target(column)?)?.size();
            if *row >= size {
                return Err(QueryError::out_of_range(format!(
                    "link operand row {row} beyond target size {size}"
                )));
            }
        }
        Ok(self.predicate(
            target,
            Condition::Compare {
                op,
                operand,
                case_sensitive,
            },
        ))
    }

    /// Builds a predicate matching rows whose link column points at `row`.
    pub fn links_to(&self, column: usize, row: usize) -> QueryResult<AtomicPredicate> {
        self.compare(column, CompareOp::Equal, Value::Link(row), true)
    }

    /// Builds an inclusive range predicate on an integer column.
    pub fn between(&self, column: usize, low: i64, high: i64) -> QueryResult<AtomicPredicate> {
        let target = self.column(column)?;
        if target.kind != DataKind::Integer {
            return Err(QueryError::type_mismatch(format!(
                "between is only defined for int columns, not {}",
                target.kind
            )));
        }
        Ok(self.predicate(target, Condition::Between { low, high }))
    }

    /// Builds a null or not-null predicate.
    pub fn null(&self, column: usize, is_null: bool) -> QueryResult<AtomicPredicate> {
        let target = self.column(column)?;
        let spec_nullable = self
            .source
            .table(target.table)?
            .column_spec(column)?
            .nullable;
        if !spec_nullable && target.kind != DataKind::Link {
            return Err(QueryError::type_mismatch(format!(
                "column {column} is not nullable"
            )));
        }
        let condition = if is_null {
            Condition::IsNull
        } else {
            Condition::IsNotNull
        };
        Ok(self.predicate(target, condition))
    }

    fn column(&self, column: usize) -> QueryResult<ColumnRef> {
        let table = self.chain.resolve(self.source, self.base)?;
        ColumnRef::resolve(self.source, table, column)
    }

    fn link_target(&self, column: usize) -> QueryResult<TableId> {
        let table = self.chain.resolve(self.source, self.base)?;
        Ok(self.source.table(table)?.link_target(column)?)
    }

    fn predicate(&self, target: ColumnRef, condition: Condition) -> AtomicPredicate {
        AtomicPredicate {
            base: self.base,
            chain: self.chain.clone(),
            target,
            condition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablink_core::{ColumnSpec, Group, Timestamp};

    fn people() -> (Group, TableId) {
        let mut group = Group::default();
        let t = group.add_table("class_Person").unwrap();
        group
            .add_column(t, ColumnSpec::new("Name", DataKind::String))
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Age", DataKind::Integer))
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Nick", DataKind::String).nullable())
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Active", DataKind::Boolean))
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Avatar", DataKind::Binary))
            .unwrap();
        group
            .add_row(
                t,
                vec![
                    Value::String("Ann".into()),
                    Value::Int(30),
                    Value::Null,
                    Value::Bool(true),
                    Value::Binary(vec![1, 2]),
                ],
            )
            .unwrap();
        (group, t)
    }

    #[test]
    fn dispatch_table() {
        assert!(supports(CompareOp::LessThan, DataKind::Timestamp));
        assert!(supports(CompareOp::Like, DataKind::String));
        assert!(supports(CompareOp::Equal, DataKind::Link));
        assert!(!supports(CompareOp::LessThan, DataKind::Boolean));
        assert!(!supports(CompareOp::GreaterThan, DataKind::Binary));
        assert!(!supports(CompareOp::Contains, DataKind::Integer));
        assert!(!supports(CompareOp::Equal, DataKind::LinkList));
        assert!(!supports(CompareOp::Equal, DataKind::Mixed));
    }

    #[test]
    fn operator_codes() {
        assert_eq!(CompareOp::from_code(1), Some(CompareOp::Equal));
        assert_eq!(CompareOp::from_code(10), Some(CompareOp::Like));
        assert_eq!(CompareOp::from_code(0), None);
    }

    #[test]
    fn incompatible_operator_is_type_mismatch() {
        let (group, t) = people();
        let builder = PredicateBuilder::new(&group, t);
        assert!(matches!(
            builder.compare(3, CompareOp::LessThan, Value::Bool(true), true),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            builder.compare(1, CompareOp::Equal, Value::String("30".into()), true),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            builder.compare(4, CompareOp::Equal, Value::Binary(vec![]), false),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn column_past_count_is_out_of_range() {
        let (group, t) = people();
        let builder = PredicateBuilder::new(&group, t);
        assert!(matches!(
            builder.compare(9, CompareOp::Equal, Value::Int(1), true),
            Err(QueryError::OutOfRange { .. })
        ));
    }

    #[test]
    fn null_predicates_need_nullable_columns() {
        let (group, t) = people();
        let builder = PredicateBuilder::new(&group, t);
        let p = builder.null(2, true).unwrap();
        assert!(p.evaluate(&group, 0).unwrap());
        assert!(!builder.null(2, false).unwrap().evaluate(&group, 0).unwrap());
        assert!(builder.null(1, true).is_err());
    }

    #[test]
    fn string_operators_and_case() {
        let (group, t) = people();
        let builder = PredicateBuilder::new(&group, t);
        let eval = |op, s: &str, cs| {
            builder
                .compare(0, op, Value::String(s.into()), cs)
                .unwrap()
                .evaluate(&group, 0)
                .unwrap()
        };
        assert!(eval(CompareOp::BeginsWith, "A", true));
        assert!(!eval(CompareOp::BeginsWith, "a", true));
        assert!(eval(CompareOp::BeginsWith, "a", false));
        assert!(eval(CompareOp::EndsWith, "NN", false));
        assert!(eval(CompareOp::Contains, "n", true));
        assert!(eval(CompareOp::Equal, "ann", false));
        assert!(!eval(CompareOp::Equal, "ann", true));
        assert!(eval(CompareOp::NotEqual, "Bo", true));
        assert!(eval(CompareOp::Like, "A?n", true));
        assert!(eval(CompareOp::Like, "*N", false));
        assert!(!eval(CompareOp::Like, "A?", true));
    }

    #[test]
    fn null_cells_only_match_not_equal() {
        assert!(!compare(CompareOp::Equal, &Value::Null, &Value::Int(1), true));
        assert!(!compare(CompareOp::LessThan, &Value::Null, &Value::Int(1), true));
        assert!(compare(CompareOp::NotEqual, &Value::Null, &Value::Int(1), true));
    }

    #[test]
    fn between_is_inclusive() {
        let (group, t) = people();
        let builder = PredicateBuilder::new(&group, t);
        assert!(builder.between(1, 30, 40).unwrap().evaluate(&group, 0).unwrap());
        assert!(!builder.between(1, 31, 40).unwrap().evaluate(&group, 0).unwrap());
        assert!(builder.between(0, 1, 2).is_err());
    }

    #[test]
    fn like_wildcards() {
        assert!(like("", ""));
        assert!(like("", "*"));
        assert!(like("abc", "a*c"));
        assert!(like("abbbc", "a*b?"));
        assert!(like("mississippi", "*sip*"));
        assert!(!like("abc", "a*d"));
        assert!(!like("ab", "???"));
    }

    #[test]
    fn timestamp_ordering() {
        let condition = Condition::Compare {
            op: CompareOp::GreaterThan,
            operand: Value::Timestamp(Timestamp::new(10, 0)),
            case_sensitive: true,
        };
        assert!(condition.matches(&Value::Timestamp(Timestamp::new(10, 1))));
        assert!(!condition.matches(&Value::Timestamp(Timestamp::new(9, 999))));
    }
}
