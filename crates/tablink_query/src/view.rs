//! Materialized result views.

use crate::error::{QueryError, QueryResult};
use crate::sort::{order_values, SortClause, SortDescriptor};
use tablink_core::{DataKind, TableId, TableSource, Value};
use tracing::trace;

/// Row indices of a base table, captured at materialization time.
///
/// A view is a snapshot: later table mutations do not change its rows,
/// though reads through it see current cell values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    table: TableId,
    rows: Vec<usize>,
}

impl TableView {
    /// Creates a view over `rows` of `table`.
    #[must_use]
    pub fn new(table: TableId, rows: Vec<usize>) -> Self {
        Self { table, rows }
    }

    /// Returns the table the rows belong to.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the view has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row indices in view order.
    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Maps a view position to its table row.
    pub fn source_row(&self, index: usize) -> QueryResult<usize> {
        self.rows.get(index).copied().ok_or_else(|| {
            QueryError::out_of_range(format!(
                "view index {index} beyond size {}",
                self.rows.len()
            ))
        })
    }

    /// Reads a cell through the view.
    pub fn get<'s>(
        &self,
        source: &'s dyn TableSource,
        column: usize,
        index: usize,
    ) -> QueryResult<&'s Value> {
        let row = self.source_row(index)?;
        Ok(source.table(self.table)?.get(column, row)?)
    }

    /// Sorts the view by one column.
    pub fn sort(&mut self, source: &dyn TableSource, column: usize, ascending: bool) -> QueryResult<()> {
        self.sort_by(source, &SortDescriptor::new(vec![SortClause::local(column, ascending)]))
    }

    /// Sorts the view by a descriptor.
    pub fn sort_by(&mut self, source: &dyn TableSource, descriptor: &SortDescriptor) -> QueryResult<()> {
        descriptor.apply(source, self.table, &mut self.rows)
    }

    /// Keeps only the first row for each distinct value of `column`.
    pub fn distinct(&mut self, source: &dyn TableSource, column: usize) -> QueryResult<()> {
        let table = source.table(self.table)?;
        let kind = table.column_kind(column)?;
        if matches!(kind, DataKind::LinkList | DataKind::Table) {
            return Err(QueryError::type_mismatch(format!(
                "distinct is not defined for {kind} columns"
            )));
        }
        let values = self
            .rows
            .iter()
            .map(|&row| table.get(column, row))
            .collect::<Result<Vec<_>, _>>()?;
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| order_values(values[a], values[b]));
        let mut keep = vec![false; values.len()];
        let mut previous: Option<usize> = None;
        for position in order {
            let duplicate = previous.is_some_and(|p| order_values(values[p], values[position]).is_eq());
            if !duplicate {
                keep[position] = true;
                previous = Some(position);
            }
        }
        let before = self.rows.len();
        let mut flags = keep.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(false));
        trace!(table = %self.table, before, after = self.rows.len(), "distinct view");
        Ok(())
    }
}
