//! Evaluation of sealed queries: rows, counts, views and aggregates.

use crate::error::{QueryError, QueryResult};
use crate::expr::Expr;
use crate::query::Query;
use crate::sort::SortDescriptor;
use crate::view::TableView;
use std::fmt;
use tablink_core::{DataKind, Table, TableId, TableSource, Value, NOT_FOUND};
use tracing::trace;

/// Aggregate function over a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum; integers wrap, floating kinds sum as `f64`.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Arithmetic mean as `f64`.
    Average,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Average => "average",
        })
    }
}

impl Aggregate {
    fn supports(self, kind: DataKind) -> bool {
        match self {
            Self::Sum | Self::Average => {
                matches!(kind, DataKind::Integer | DataKind::Float | DataKind::Double)
            }
            Self::Min | Self::Max => matches!(
                kind,
                DataKind::Integer | DataKind::Float | DataKind::Double | DataKind::Timestamp
            ),
        }
    }
}

/// Half-open row range with a match limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// First row scanned.
    pub start: usize,
    /// One past the last row scanned; `usize::MAX` means table end.
    pub end: usize,
    /// Maximum matches; `usize::MAX` means unlimited.
    pub limit: usize,
}

impl Range {
    /// The whole table, unlimited.
    pub const ALL: Self = Self {
        start: 0,
        end: usize::MAX,
        limit: usize::MAX,
    };

    /// Creates a range.
    #[must_use]
    pub const fn new(start: usize, end: usize, limit: usize) -> Self {
        Self { start, end, limit }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::ALL
    }
}

impl Query {
    /// Returns the first matching row at or after `offset`, or [`NOT_FOUND`].
    pub fn find(&mut self, source: &dyn TableSource, offset: usize) -> QueryResult<usize> {
        let table = self.table();
        let expr = self.seal()?;
        let size = source.table(table)?.size();
        if offset >= size {
            return Ok(NOT_FOUND);
        }
        let mut found = NOT_FOUND;
        scan(expr, source, table, Range::new(offset, size, 1), |row| {
            found = row;
        })?;
        Ok(found)
    }

    /// Returns the first matching row after `row`, or [`NOT_FOUND`].
    pub fn find_next(&mut self, source: &dyn TableSource, row: usize) -> QueryResult<usize> {
        match row.checked_add(1) {
            Some(offset) => self.find(source, offset),
            None => Ok(NOT_FOUND),
        }
    }

    /// Collects matching rows in ascending order.
    pub fn find_all(&mut self, source: &dyn TableSource, range: Range) -> QueryResult<TableView> {
        let table = self.table();
        let expr = self.seal()?;
        let mut rows = Vec::new();
        scan(expr, source, table, range, |row| rows.push(row))?;
        Ok(TableView::new(table, rows))
    }

    /// Collects matching rows ordered by `descriptor`.
    pub fn find_all_sorted(
        &mut self,
        source: &dyn TableSource,
        descriptor: &SortDescriptor,
    ) -> QueryResult<TableView> {
        let mut view = self.find_all(source, Range::ALL)?;
        view.sort_by(source, descriptor)?;
        Ok(view)
    }

    /// Counts matching rows.
    pub fn count(&mut self, source: &dyn TableSource, range: Range) -> QueryResult<usize> {
        let table = self.table();
        let expr = self.seal()?;
        let mut count = 0;
        scan(expr, source, table, range, |_| count += 1)?;
        Ok(count)
    }

    /// Aggregates `column` over every matching row, skipping nulls.
    ///
    /// Sum yields `Int` for integer columns and `Double` otherwise. Min and
    /// max keep the column's kind and yield `Null` when nothing matched.
    /// Average is always a `Double`, `0.0` when nothing matched.
    pub fn aggregate(
        &mut self,
        source: &dyn TableSource,
        column: usize,
        function: Aggregate,
    ) -> QueryResult<Value> {
        let table_id = self.table();
        let table = source.table(table_id)?;
        let kind = table.column_kind(column)?;
        if !function.supports(kind) {
            return Err(QueryError::type_mismatch(format!(
                "{function} is not defined for {kind} columns"
            )));
        }
        let expr = self.seal()?;
        let mut rows = Vec::new();
        scan(expr, source, table_id, Range::ALL, |row| rows.push(row))?;
        fold(table, column, kind, function, &rows)
    }
}

fn scan(
    expr: &Expr,
    source: &dyn TableSource,
    table: TableId,
    range: Range,
    mut on_match: impl FnMut(usize),
) -> QueryResult<()> {
    let size = source.table(table)?.size();
    let end = range.end.min(size);
    let mut matched = 0;
    let mut scanned = 0;
    if range.limit > 0 {
        for row in range.start..end {
            scanned += 1;
            if expr.evaluate(source, row)? {
                on_match(row);
                matched += 1;
                if matched >= range.limit {
                    break;
                }
            }
        }
    }
    trace!(%table, start = range.start, end, scanned, matched, "materialized query");
    Ok(())
}

fn fold(
    table: &Table,
    column: usize,
    kind: DataKind,
    function: Aggregate,
    rows: &[usize],
) -> QueryResult<Value> {
    let mut values = Vec::with_capacity(rows.len());
    for &row in rows {
        let value = table.get(column, row)?;
        if !value.is_null() {
            values.push(value);
        }
    }
    Ok(match function {
        Aggregate::Sum if kind == DataKind::Integer => Value::Int(
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .fold(0i64, i64::wrapping_add),
        ),
        Aggregate::Sum => Value::Double(values.iter().filter_map(|v| v.as_f64()).sum()),
        Aggregate::Average => {
            if values.is_empty() {
                Value::Double(0.0)
            } else {
                let sum: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
                Value::Double(sum / values.len() as f64)
            }
        }
        Aggregate::Min => extreme(&values, std::cmp::Ordering::Less),
        Aggregate::Max => extreme(&values, std::cmp::Ordering::Greater),
    })
}

/// NaN is unordered against everything, so it never becomes the extreme.
fn extreme(values: &[&Value], wanted: std::cmp::Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for &value in values {
        if value.as_f64().is_some_and(f64::is_nan) {
            continue;
        }
        best = match best {
            Some(current) if value.compare(current) != Some(wanted) => Some(current),
            _ => Some(value),
        };
    }
    best.cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::CompareOp;
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
            .add_column(t, ColumnSpec::new("Score", DataKind::Double).nullable())
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Born", DataKind::Timestamp))
            .unwrap();
        for (name, age, score, born) in [
            ("Ann", 30, Value::Double(1.5), 100),
            ("Bo", 25, Value::Null, 50),
            ("Cy", 30, Value::Double(2.5), 75),
        ] {
            group
                .add_row(
                    t,
                    vec![
                        Value::String(name.into()),
                        Value::Int(age),
                        score,
                        Value::Timestamp(Timestamp::new(born, 0)),
                    ],
                )
                .unwrap();
        }
        (group, t)
    }

    fn age_30(group: &Group, t: TableId) -> Query {
        let mut query = Query::new(t);
        query
            .compare(group, 1, CompareOp::Equal, Value::Int(30), true)
            .unwrap();
        query
    }

    #[test]
    fn find_and_find_next() {
        let (group, t) = people();
        let mut query = age_30(&group, t);
        assert_eq!(query.find(&group, 0).unwrap(), 0);
        assert_eq!(query.find_next(&group, 0).unwrap(), 2);
        assert_eq!(query.find_next(&group, 2).unwrap(), NOT_FOUND);
        assert_eq!(query.find(&group, 3).unwrap(), NOT_FOUND);
        assert_eq!(query.find(&group, usize::MAX).unwrap(), NOT_FOUND);
    }

    #[test]
    fn ranges_and_limits() {
        let (group, t) = people();
        let mut query = age_30(&group, t);
        assert_eq!(query.find_all(&group, Range::ALL).unwrap().rows(), &[0, 2]);
        assert_eq!(query.find_all(&group, Range::new(1, 3, usize::MAX)).unwrap().rows(), &[2]);
        assert_eq!(query.find_all(&group, Range::new(0, 3, 1)).unwrap().rows(), &[0]);
        assert_eq!(query.count(&group, Range::new(0, 2, usize::MAX)).unwrap(), 1);
        assert_eq!(query.count(&group, Range::new(0, usize::MAX, 0)).unwrap(), 0);
        assert_eq!(query.count(&group, Range::new(5, 2, usize::MAX)).unwrap(), 0);
    }

    #[test]
    fn repeated_materialization_reflects_mutation() {
        let (mut group, t) = people();
        let mut query = age_30(&group, t);
        let first = query.find_all(&group, Range::ALL).unwrap();
        assert_eq!(first, query.find_all(&group, Range::ALL).unwrap());
        group
            .add_row(
                t,
                vec![
                    Value::String("Di".into()),
                    Value::Int(30),
                    Value::Null,
                    Value::Timestamp(Timestamp::default()),
                ],
            )
            .unwrap();
        assert_eq!(query.find_all(&group, Range::ALL).unwrap().rows(), &[0, 2, 3]);
        group.remove_row(t, 0).unwrap();
        assert_eq!(query.find_all(&group, Range::ALL).unwrap().rows(), &[1, 2]);
    }

    #[test]
    fn aggregates() {
        let (group, t) = people();
        let mut all = Query::new(t);
        assert_eq!(all.aggregate(&group, 1, Aggregate::Sum).unwrap(), Value::Int(85));
        assert_eq!(all.aggregate(&group, 1, Aggregate::Min).unwrap(), Value::Int(25));
        assert_eq!(all.aggregate(&group, 2, Aggregate::Max).unwrap(), Value::Double(2.5));
        assert_eq!(all.aggregate(&group, 2, Aggregate::Sum).unwrap(), Value::Double(4.0));
        assert_eq!(all.aggregate(&group, 2, Aggregate::Average).unwrap(), Value::Double(2.0));
        assert_eq!(
            all.aggregate(&group, 3, Aggregate::Min).unwrap(),
            Value::Timestamp(Timestamp::new(50, 0))
        );
        assert!(matches!(
            all.aggregate(&group, 0, Aggregate::Sum),
            Err(QueryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            all.aggregate(&group, 3, Aggregate::Average),
            Err(QueryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn min_and_max_skip_nan() {
        let mut group = Group::default();
        let t = group.add_table("class_Reading").unwrap();
        group
            .add_column(t, ColumnSpec::new("Level", DataKind::Double))
            .unwrap();
        for level in [f64::NAN, 3.0, 1.0, f64::NAN] {
            group.add_row(t, vec![Value::Double(level)]).unwrap();
        }
        let mut all = Query::new(t);
        assert_eq!(all.aggregate(&group, 0, Aggregate::Min).unwrap(), Value::Double(1.0));
        assert_eq!(all.aggregate(&group, 0, Aggregate::Max).unwrap(), Value::Double(3.0));
    }

    #[test]
    fn aggregates_over_no_rows() {
        let (group, t) = people();
        let mut none = Query::new(t);
        none.compare(&group, 1, CompareOp::GreaterThan, Value::Int(99), true)
            .unwrap();
        assert_eq!(none.aggregate(&group, 1, Aggregate::Max).unwrap(), Value::Null);
        assert_eq!(none.aggregate(&group, 1, Aggregate::Sum).unwrap(), Value::Int(0));
        assert_eq!(
            none.aggregate(&group, 1, Aggregate::Average).unwrap(),
            Value::Double(0.0)
        );
    }
}
