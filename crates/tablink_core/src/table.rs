//! Column-oriented tables.

use crate::error::{CoreError, CoreResult};
use crate::types::{DataKind, TableId};
use crate::value::{Timestamp, Value};

/// Declaration of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name, unique within its table.
    pub name: String,
    /// Declared data kind.
    pub kind: DataKind,
    /// Whether the column accepts null.
    pub nullable: bool,
    /// Target table for link and link-list columns.
    pub link_target: Option<TableId>,
}

impl ColumnSpec {
    /// Creates a non-nullable column of the given kind.
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            link_target: None,
        }
    }

    /// Creates a link or link-list column pointing at `target`.
    pub fn link(name: impl Into<String>, kind: DataKind, target: TableId) -> Self {
        Self {
            name: name.into(),
            kind,
            // a single link is null until set
            nullable: kind == DataKind::Link,
            link_target: Some(target),
        }
    }

    /// Makes the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Column {
    spec: ColumnSpec,
    values: Vec<Value>,
}

impl Column {
    fn fresh_value(&self) -> Value {
        if self.spec.nullable && self.spec.kind != DataKind::LinkList {
            Value::Null
        } else {
            Value::default_for(self.spec.kind)
        }
    }
}

/// A table: a named set of equally long columns.
#[derive(Debug, Clone)]
pub struct Table {
    id: TableId,
    name: String,
    columns: Vec<Column>,
    size: usize,
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            size: 0,
        }
    }

    /// Returns the table id.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns the physical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the declaration of a column.
    pub fn column_spec(&self, column: usize) -> CoreResult<&ColumnSpec> {
        self.columns
            .get(column)
            .map(|c| &c.spec)
            .ok_or(CoreError::ColumnOutOfRange {
                column,
                count: self.columns.len(),
            })
    }

    /// Returns a column's name.
    pub fn column_name(&self, column: usize) -> CoreResult<&str> {
        Ok(&self.column_spec(column)?.name)
    }

    /// Returns a column's declared kind.
    pub fn column_kind(&self, column: usize) -> CoreResult<DataKind> {
        Ok(self.column_spec(column)?.kind)
    }

    /// Finds a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.spec.name == name)
    }

    /// Returns the target table of a link or link-list column.
    pub fn link_target(&self, column: usize) -> CoreResult<TableId> {
        let spec = self.column_spec(column)?;
        match (spec.kind.is_link(), spec.link_target) {
            (true, Some(target)) => Ok(target),
            _ => Err(CoreError::NotALink { column }),
        }
    }

    /// Appends a column, filling existing rows with its fresh value.
    pub fn add_column(&mut self, spec: ColumnSpec) -> CoreResult<usize> {
        if spec.kind == DataKind::Table {
            return Err(CoreError::invalid_operation(
                "subtable columns are not supported",
            ));
        }
        if spec.kind.is_link() != spec.link_target.is_some() {
            return Err(CoreError::type_mismatch(format!(
                "column '{}' of kind {} has inconsistent link target",
                spec.name, spec.kind
            )));
        }
        if self.column_index(&spec.name).is_some() {
            return Err(CoreError::invalid_operation(format!(
                "duplicate column name '{}'",
                spec.name
            )));
        }
        let mut column = Column {
            spec,
            values: Vec::with_capacity(self.size),
        };
        let fresh = column.fresh_value();
        column.values.resize(self.size, fresh);
        self.columns.push(column);
        Ok(self.columns.len() - 1)
    }

    /// Appends a row holding every column's fresh value.
    pub fn add_empty_row(&mut self) -> usize {
        for column in &mut self.columns {
            let fresh = column.fresh_value();
            column.values.push(fresh);
        }
        self.size += 1;
        self.size - 1
    }

    /// Returns a cell value.
    pub fn get(&self, column: usize, row: usize) -> CoreResult<&Value> {
        self.check_row(row)?;
        let col = self.columns.get(column).ok_or(CoreError::ColumnOutOfRange {
            column,
            count: self.columns.len(),
        })?;
        Ok(&col.values[row])
    }

    /// Stores a cell value after checking it against the column declaration.
    ///
    /// Link targets are not range-checked here; the owning group does that.
    pub fn set(&mut self, column: usize, row: usize, value: Value) -> CoreResult<()> {
        self.check_row(row)?;
        let spec = self.column_spec(column)?;
        if value.is_null() && !spec.nullable {
            return Err(CoreError::type_mismatch(format!(
                "column '{}' is not nullable",
                spec.name
            )));
        }
        if !value.fits(spec.kind) {
            return Err(CoreError::type_mismatch(format!(
                "cannot store {} in {} column '{}'",
                value.kind().map_or("null".to_string(), |k| k.to_string()),
                spec.kind,
                spec.name
            )));
        }
        self.columns[column].values[row] = value;
        Ok(())
    }

    /// Returns true if the cell is null.
    pub fn is_null(&self, column: usize, row: usize) -> CoreResult<bool> {
        Ok(self.get(column, row)?.is_null())
    }

    /// Returns an integer cell.
    pub fn get_int(&self, column: usize, row: usize) -> CoreResult<Option<i64>> {
        self.expect_kind(column, DataKind::Integer)?;
        match self.get(column, row)? {
            Value::Int(v) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Returns a boolean cell.
    pub fn get_bool(&self, column: usize, row: usize) -> CoreResult<Option<bool>> {
        self.expect_kind(column, DataKind::Boolean)?;
        match self.get(column, row)? {
            Value::Bool(v) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Returns a float cell.
    pub fn get_float(&self, column: usize, row: usize) -> CoreResult<Option<f32>> {
        self.expect_kind(column, DataKind::Float)?;
        match self.get(column, row)? {
            Value::Float(v) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Returns a double cell.
    pub fn get_double(&self, column: usize, row: usize) -> CoreResult<Option<f64>> {
        self.expect_kind(column, DataKind::Double)?;
        match self.get(column, row)? {
            Value::Double(v) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Returns a string cell. The slice is valid until the row is mutated.
    pub fn get_string(&self, column: usize, row: usize) -> CoreResult<Option<&str>> {
        self.expect_kind(column, DataKind::String)?;
        match self.get(column, row)? {
            Value::String(v) => Ok(Some(v.as_str())),
            _ => Ok(None),
        }
    }

    /// Returns a binary cell.
    pub fn get_binary(&self, column: usize, row: usize) -> CoreResult<Option<&[u8]>> {
        self.expect_kind(column, DataKind::Binary)?;
        match self.get(column, row)? {
            Value::Binary(v) => Ok(Some(v.as_slice())),
            _ => Ok(None),
        }
    }

    /// Returns a timestamp cell.
    pub fn get_timestamp(&self, column: usize, row: usize) -> CoreResult<Option<Timestamp>> {
        self.expect_kind(column, DataKind::Timestamp)?;
        match self.get(column, row)? {
            Value::Timestamp(v) => Ok(Some(*v)),
            _ => Ok(None),
        }
    }

    /// Returns the target row of a link cell, or `None` for a null link.
    pub fn get_link(&self, column: usize, row: usize) -> CoreResult<Option<usize>> {
        self.expect_kind(column, DataKind::Link)?;
        match self.get(column, row)? {
            Value::Link(target) => Ok(Some(*target)),
            _ => Ok(None),
        }
    }

    /// Returns the target rows of a link-list cell.
    pub fn get_link_list(&self, column: usize, row: usize) -> CoreResult<&[usize]> {
        self.expect_kind(column, DataKind::LinkList)?;
        match self.get(column, row)? {
            Value::LinkList(targets) => Ok(targets.as_slice()),
            _ => Ok(&[]),
        }
    }

    /// Returns the rows reachable from `row` through a link or link-list column.
    pub fn follow(&self, column: usize, row: usize) -> CoreResult<Vec<usize>> {
        let spec = self.column_spec(column)?;
        if !spec.kind.is_link() {
            return Err(CoreError::NotALink { column });
        }
        Ok(match self.get(column, row)? {
            Value::Link(target) => vec![*target],
            Value::LinkList(targets) => targets.clone(),
            _ => Vec::new(),
        })
    }

    /// Removes a row, shifting later rows down by one.
    pub(crate) fn remove_row(&mut self, row: usize) -> CoreResult<()> {
        self.check_row(row)?;
        for column in &mut self.columns {
            column.values.remove(row);
        }
        self.size -= 1;
        Ok(())
    }

    /// Rewrites links into `target` after row `removed` of that table was deleted.
    pub(crate) fn retarget_links(&mut self, target: TableId, removed: usize) {
        for column in &mut self.columns {
            if column.spec.link_target != Some(target) {
                continue;
            }
            for value in &mut column.values {
                let dangling = match value {
                    Value::Link(row) if *row == removed => true,
                    Value::Link(row) => {
                        if *row > removed {
                            *row -= 1;
                        }
                        false
                    }
                    Value::LinkList(rows) => {
                        rows.retain(|r| *r != removed);
                        for r in rows.iter_mut().filter(|r| **r > removed) {
                            *r -= 1;
                        }
                        false
                    }
                    _ => false,
                };
                if dangling {
                    *value = Value::Null;
                }
            }
        }
    }

    fn check_row(&self, row: usize) -> CoreResult<()> {
        if row < self.size {
            Ok(())
        } else {
            Err(CoreError::RowOutOfRange {
                row,
                size: self.size,
            })
        }
    }

    fn expect_kind(&self, column: usize, kind: DataKind) -> CoreResult<()> {
        let declared = self.column_kind(column)?;
        if declared == kind {
            Ok(())
        } else {
            Err(CoreError::type_mismatch(format!(
                "column {column} is {declared}, not {kind}"
            )))
        }
    }
}

/// Read access to the tables of a group.
///
/// This is the table service the query layer consumes.
pub trait TableSource {
    /// Returns a table by id.
    fn table(&self, id: TableId) -> CoreResult<&Table>;

    /// Returns the number of tables.
    fn table_count(&self) -> usize;
}
