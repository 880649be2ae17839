//! A group of tables that may link to each other.

use crate::error::{CoreError, CoreResult};
use crate::schema::ObjectStore;
use crate::table::{ColumnSpec, Table, TableSource};
use crate::types::{DataKind, TableId};
use crate::value::Value;

/// A set of tables addressed by id.
///
/// Link integrity is maintained here: link targets are range-checked on
/// write and rewritten when a target row is removed.
#[derive(Debug, Clone)]
pub struct Group {
    tables: Vec<Table>,
    max_tables: usize,
}

impl Default for Group {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

impl Group {
    /// Creates an empty group holding at most `max_tables` tables.
    #[must_use]
    pub fn new(max_tables: usize) -> Self {
        Self {
            tables: Vec::new(),
            max_tables,
        }
    }

    /// Adds an empty table.
    pub fn add_table(&mut self, name: impl Into<String>) -> CoreResult<TableId> {
        let name = name.into();
        if self.find_table(&name).is_some() {
            return Err(CoreError::DuplicateTable { name });
        }
        if self.tables.len() >= self.max_tables {
            return Err(CoreError::TooManyTables {
                limit: self.max_tables,
            });
        }
        let id = TableId::new(self.tables.len() as u32);
        self.tables.push(Table::new(id, name));
        Ok(id)
    }

    /// Returns a table for mutation.
    pub fn table_mut(&mut self, id: TableId) -> CoreResult<&mut Table> {
        self.tables
            .get_mut(id.index())
            .ok_or(CoreError::UnknownTable { id: id.as_u32() })
    }

    /// Adds a scalar column to a table.
    pub fn add_column(&mut self, table: TableId, spec: ColumnSpec) -> CoreResult<usize> {
        if let Some(target) = spec.link_target {
            self.table(target)?;
        }
        self.table_mut(table)?.add_column(spec)
    }

    /// Adds a link or link-list column from `table` to `target`.
    pub fn add_link_column(
        &mut self,
        table: TableId,
        name: impl Into<String>,
        kind: DataKind,
        target: TableId,
    ) -> CoreResult<usize> {
        if !kind.is_link() {
            return Err(CoreError::type_mismatch(format!(
                "{kind} is not a link kind"
            )));
        }
        self.add_column(table, ColumnSpec::link(name, kind, target))
    }

    /// Appends an empty row to a table.
    pub fn add_empty_row(&mut self, table: TableId) -> CoreResult<usize> {
        Ok(self.table_mut(table)?.add_empty_row())
    }

    /// Appends a row with the given values, one per column.
    pub fn add_row(&mut self, table: TableId, values: Vec<Value>) -> CoreResult<usize> {
        let count = self.table(table)?.column_count();
        if values.len() != count {
            return Err(CoreError::type_mismatch(format!(
                "expected {count} values, got {}",
                values.len()
            )));
        }
        let row = self.add_empty_row(table)?;
        for (column, value) in values.into_iter().enumerate() {
            if let Err(e) = self.set_value(table, column, row, value) {
                self.table_mut(table)?.remove_row(row)?;
                return Err(e);
            }
        }
        Ok(row)
    }

    /// Stores a cell value, range-checking link targets.
    pub fn set_value(
        &mut self,
        table: TableId,
        column: usize,
        row: usize,
        value: Value,
    ) -> CoreResult<()> {
        let link_target = self.table(table)?.column_spec(column)?.link_target;
        if let Some(target) = link_target {
            let size = self.table(target)?.size();
            let check = |r: usize| {
                if r < size {
                    Ok(())
                } else {
                    Err(CoreError::RowOutOfRange { row: r, size })
                }
            };
            match &value {
                Value::Link(r) => check(*r)?,
                Value::LinkList(rows) => rows.iter().try_for_each(|r| check(*r))?,
                _ => {}
            }
        }
        self.table_mut(table)?.set(column, row, value)
    }

    /// Sets or clears a link cell.
    pub fn set_link(
        &mut self,
        table: TableId,
        column: usize,
        row: usize,
        target_row: Option<usize>,
    ) -> CoreResult<()> {
        self.set_value(table, column, row, target_row.map_or(Value::Null, Value::Link))
    }

    /// Appends a target row to a link-list cell.
    pub fn link_list_add(
        &mut self,
        table: TableId,
        column: usize,
        row: usize,
        target_row: usize,
    ) -> CoreResult<()> {
        let mut rows = self.table(table)?.get_link_list(column, row)?.to_vec();
        rows.push(target_row);
        self.set_value(table, column, row, Value::LinkList(rows))
    }

    /// Removes a row and rewrites every link that pointed into the table.
    pub fn remove_row(&mut self, table: TableId, row: usize) -> CoreResult<()> {
        self.table_mut(table)?.remove_row(row)?;
        for other in &mut self.tables {
            other.retarget_links(table, row);
        }
        Ok(())
    }
}

impl TableSource for Group {
    fn table(&self, id: TableId) -> CoreResult<&Table> {
        self.tables
            .get(id.index())
            .ok_or(CoreError::UnknownTable { id: id.as_u32() })
    }

    fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl ObjectStore for Group {
    fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables.iter().find(|t| t.name() == name).map(Table::id)
    }
}
