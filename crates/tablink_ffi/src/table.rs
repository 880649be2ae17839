//! Table FFI functions: schema, rows and typed cells.
//!
//! Reads go through the owning group's current state. Mutations need a
//! read-write handle and an open write transaction.

use crate::buffer::TlBuffer;
use crate::call::{out, signal, size, slice, status, text_arg, text_out};
use crate::error::{FfiError, FfiResult, TlResult};
use crate::handles::{registry, Handle, Object, QueryRef, ViewRef, NULL_HANDLE};
use tablink_core::{ColumnSpec, DataKind, TableSource, Timestamp, Value, NOT_FOUND};
use tablink_query::{Query, Range};

fn kind_arg(code: u32) -> FfiResult<DataKind> {
    DataKind::from_code(code).ok_or(FfiError::UnknownCode {
        what: "data kind",
        code,
    })
}

/// Adds a scalar column. Requires a read-write handle.
///
/// # Arguments
///
/// * `table` - The table handle
/// * `kind` - Data kind code
/// * `name` / `name_len` - UTF-16 column name
/// * `nullable` - Whether cells may be null
/// * `out_column` - Output for the new column index
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_column` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_table_add_column(
    table: Handle,
    kind: u32,
    name: *const u16,
    name_len: usize,
    nullable: bool,
    out_column: *mut usize,
) -> TlResult {
    status(|| {
        let out_column = out(out_column, "out_column")?;
        let kind = kind_arg(kind)?;
        let name = text_arg(name, name_len, "name")?;
        let mut spec = ColumnSpec::new(name, kind);
        if nullable {
            spec = spec.nullable();
        }
        *out_column = registry().with_table_mut(table, |id, group| Ok(group.add_column(id, spec)?))?;
        Ok(())
    })
}

/// Adds a link or link-list column pointing at `target`.
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_column` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_table_add_link_column(
    table: Handle,
    kind: u32,
    name: *const u16,
    name_len: usize,
    target: Handle,
    out_column: *mut usize,
) -> TlResult {
    status(|| {
        let out_column = out(out_column, "out_column")?;
        let kind = kind_arg(kind)?;
        let name = text_arg(name, name_len, "name")?;
        let mut registry = registry();
        let source = registry.table(table)?;
        let target = registry.table(target)?;
        if source.group != target.group {
            return Err(FfiError::invalid_handle(
                target.group,
                "link target in the same group",
            ));
        }
        *out_column = registry.with_table_mut(table, |id, group| {
            Ok(group.add_link_column(id, name, kind, target.table)?)
        })?;
        Ok(())
    })
}

/// Returns the number of columns.
///
/// # Safety
///
/// `out_count` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_column_count(table: Handle, out_count: *mut usize) -> TlResult {
    status(|| {
        let out_count = out(out_count, "out_count")?;
        *out_count = registry().with_table(table, |id, g| Ok(g.table(id)?.column_count()))?;
        Ok(())
    })
}

/// Copies a column name into a UTF-16 buffer.
///
/// # Returns
///
/// Units written; a larger capacity to retry with; or a negative code.
///
/// # Safety
///
/// `buffer` must be valid for `capacity` units.
#[no_mangle]
pub unsafe extern "C" fn tl_table_column_name(
    table: Handle,
    column: usize,
    buffer: *mut u16,
    capacity: usize,
) -> isize {
    size(|| {
        registry().with_table(table, |id, g| {
            text_out(g.table(id)?.column_name(column)?, buffer, capacity)
        })
    })
}

/// Looks up a column by name; writes `usize::MAX` if absent.
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_column` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_table_column_index(
    table: Handle,
    name: *const u16,
    name_len: usize,
    out_column: *mut usize,
) -> TlResult {
    status(|| {
        let out_column = out(out_column, "out_column")?;
        let name = text_arg(name, name_len, "name")?;
        *out_column = registry().with_table(table, |id, g| {
            Ok(g.table(id)?.column_index(&name).unwrap_or(NOT_FOUND))
        })?;
        Ok(())
    })
}

/// Returns a column's data kind code.
///
/// # Safety
///
/// `out_kind` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_column_kind(
    table: Handle,
    column: usize,
    out_kind: *mut u32,
) -> TlResult {
    status(|| {
        let out_kind = out(out_kind, "out_kind")?;
        *out_kind = registry().with_table(table, |id, g| Ok(g.table(id)?.column_kind(column)?))?.code();
        Ok(())
    })
}

/// Signals whether a column accepts nulls.
#[no_mangle]
pub extern "C" fn tl_table_is_nullable(table: Handle, column: usize) -> isize {
    signal(|| {
        registry().with_table(table, |id, g| Ok(g.table(id)?.column_spec(column)?.nullable))
    })
}

/// Returns the number of rows.
///
/// # Safety
///
/// `out_size` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_size(table: Handle, out_size: *mut usize) -> TlResult {
    status(|| {
        let out_size = out(out_size, "out_size")?;
        *out_size = registry().with_table(table, |id, g| Ok(g.table(id)?.size()))?;
        Ok(())
    })
}

/// Signals whether the table has no rows.
#[no_mangle]
pub extern "C" fn tl_table_is_empty(table: Handle) -> isize {
    signal(|| registry().with_table(table, |id, g| Ok(g.table(id)?.is_empty())))
}

/// Signals whether the handle still refers to a live table.
///
/// Stale handles and tables discarded by a rollback answer false; handles of
/// another type are an error.
#[no_mangle]
pub extern "C" fn tl_table_is_attached(table: Handle) -> isize {
    signal(|| {
        let registry = registry();
        if !registry.is_live(table) {
            return Ok(false);
        }
        registry.with_table(table, |id, g| Ok(g.table(id).is_ok()))
    })
}

/// Signals whether `row` is a valid row index.
#[no_mangle]
pub extern "C" fn tl_table_is_valid_row(table: Handle, row: usize) -> isize {
    signal(|| registry().with_table(table, |id, g| Ok(row < g.table(id)?.size())))
}

/// Appends a row of default values.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_add_empty_row(table: Handle, out_row: *mut usize) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = registry().with_table_mut(table, |id, g| Ok(g.add_empty_row(id)?))?;
        Ok(())
    })
}

/// Removes a row; links into it are cleared and later rows shift down.
#[no_mangle]
pub extern "C" fn tl_table_remove_row(table: Handle, row: usize) -> TlResult {
    status(|| registry().with_table_mut(table, |id, g| Ok(g.remove_row(id, row)?)))
}

fn set(table: Handle, column: usize, row: usize, value: Value) -> FfiResult<()> {
    registry().with_table_mut(table, |id, g| Ok(g.set_value(id, column, row, value)?))
}

/// Copies a string cell into a UTF-16 buffer. Null cells copy as empty.
///
/// # Returns
///
/// Units written; a larger capacity to retry with; or a negative code.
///
/// # Safety
///
/// `buffer` must be valid for `capacity` units.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_string(
    table: Handle,
    column: usize,
    row: usize,
    buffer: *mut u16,
    capacity: usize,
) -> isize {
    size(|| {
        registry().with_table(table, |id, g| {
            let value = g.table(id)?.get_string(column, row)?.unwrap_or_default();
            text_out(value, buffer, capacity)
        })
    })
}

/// Stores a string cell.
///
/// # Safety
///
/// `value` must point to `value_len` units.
#[no_mangle]
pub unsafe extern "C" fn tl_table_set_string(
    table: Handle,
    column: usize,
    row: usize,
    value: *const u16,
    value_len: usize,
) -> TlResult {
    status(|| {
        let value = text_arg(value, value_len, "value")?;
        set(table, column, row, Value::String(value))
    })
}

/// Reads an integer cell; null reads as zero.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_int(
    table: Handle,
    column: usize,
    row: usize,
    out_value: *mut i64,
) -> TlResult {
    status(|| {
        let out_value = out(out_value, "out_value")?;
        *out_value = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_int(column, row)?))?
            .unwrap_or_default();
        Ok(())
    })
}

/// Stores an integer cell.
#[no_mangle]
pub extern "C" fn tl_table_set_int(table: Handle, column: usize, row: usize, value: i64) -> TlResult {
    status(|| set(table, column, row, Value::Int(value)))
}

/// Reads a boolean cell; null reads as false.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_bool(
    table: Handle,
    column: usize,
    row: usize,
    out_value: *mut bool,
) -> TlResult {
    status(|| {
        let out_value = out(out_value, "out_value")?;
        *out_value = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_bool(column, row)?))?
            .unwrap_or_default();
        Ok(())
    })
}

/// Stores a boolean cell.
#[no_mangle]
pub extern "C" fn tl_table_set_bool(table: Handle, column: usize, row: usize, value: bool) -> TlResult {
    status(|| set(table, column, row, Value::Bool(value)))
}

/// Reads a float cell; null reads as zero.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_float(
    table: Handle,
    column: usize,
    row: usize,
    out_value: *mut f32,
) -> TlResult {
    status(|| {
        let out_value = out(out_value, "out_value")?;
        *out_value = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_float(column, row)?))?
            .unwrap_or_default();
        Ok(())
    })
}

/// Stores a float cell.
#[no_mangle]
pub extern "C" fn tl_table_set_float(table: Handle, column: usize, row: usize, value: f32) -> TlResult {
    status(|| set(table, column, row, Value::Float(value)))
}

/// Reads a double cell; null reads as zero.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_double(
    table: Handle,
    column: usize,
    row: usize,
    out_value: *mut f64,
) -> TlResult {
    status(|| {
        let out_value = out(out_value, "out_value")?;
        *out_value = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_double(column, row)?))?
            .unwrap_or_default();
        Ok(())
    })
}

/// Stores a double cell.
#[no_mangle]
pub extern "C" fn tl_table_set_double(table: Handle, column: usize, row: usize, value: f64) -> TlResult {
    status(|| set(table, column, row, Value::Double(value)))
}

/// Reads a timestamp cell as ticks (100 ns since 0001-01-01).
///
/// # Safety
///
/// `out_ticks` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_timestamp_ticks(
    table: Handle,
    column: usize,
    row: usize,
    out_ticks: *mut i64,
) -> TlResult {
    status(|| {
        let out_ticks = out(out_ticks, "out_ticks")?;
        *out_ticks = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_timestamp(column, row)?))?
            .unwrap_or_default()
            .to_ticks();
        Ok(())
    })
}

/// Stores a timestamp cell given as ticks.
#[no_mangle]
pub extern "C" fn tl_table_set_timestamp_ticks(
    table: Handle,
    column: usize,
    row: usize,
    ticks: i64,
) -> TlResult {
    status(|| set(table, column, row, Value::Timestamp(Timestamp::from_ticks(ticks))))
}

/// Copies a binary cell into an engine-allocated buffer.
///
/// Null cells produce a null buffer. Release with `tl_buffer_free`.
///
/// # Safety
///
/// `out_buffer` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_binary(
    table: Handle,
    column: usize,
    row: usize,
    out_buffer: *mut TlBuffer,
) -> TlResult {
    status(|| {
        let out_buffer = out(out_buffer, "out_buffer")?;
        *out_buffer = TlBuffer::empty();
        let bytes = registry().with_table(table, |id, g| {
            Ok(g.table(id)?.get_binary(column, row)?.map(<[u8]>::to_vec))
        })?;
        *out_buffer = bytes.map_or_else(TlBuffer::empty, TlBuffer::from_vec);
        Ok(())
    })
}

/// Stores a binary cell.
///
/// # Safety
///
/// `data` must point to `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn tl_table_set_binary(
    table: Handle,
    column: usize,
    row: usize,
    data: *const u8,
    len: usize,
) -> TlResult {
    status(|| {
        let bytes = slice(data, len, "data")?.to_vec();
        set(table, column, row, Value::Binary(bytes))
    })
}

/// Reads a link cell; writes `usize::MAX` for a null link.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_get_link(
    table: Handle,
    column: usize,
    row: usize,
    out_row: *mut usize,
) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_link(column, row)?))?
            .unwrap_or(NOT_FOUND);
        Ok(())
    })
}

/// Points a link cell at `target_row`; `usize::MAX` clears it.
#[no_mangle]
pub extern "C" fn tl_table_set_link(
    table: Handle,
    column: usize,
    row: usize,
    target_row: usize,
) -> TlResult {
    status(|| {
        let target = (target_row != NOT_FOUND).then_some(target_row);
        registry().with_table_mut(table, |id, g| Ok(g.set_link(id, column, row, target)?))
    })
}

/// Appends `target_row` to a link-list cell.
#[no_mangle]
pub extern "C" fn tl_table_linklist_add(
    table: Handle,
    column: usize,
    row: usize,
    target_row: usize,
) -> TlResult {
    status(|| {
        registry().with_table_mut(table, |id, g| Ok(g.link_list_add(id, column, row, target_row)?))
    })
}

/// Returns the number of targets in a link-list cell.
///
/// # Safety
///
/// `out_size` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_linklist_size(
    table: Handle,
    column: usize,
    row: usize,
    out_size: *mut usize,
) -> TlResult {
    status(|| {
        let out_size = out(out_size, "out_size")?;
        *out_size = registry()
            .with_table(table, |id, g| Ok(g.table(id)?.get_link_list(column, row)?.len()))?;
        Ok(())
    })
}

/// Returns the target row at `index` of a link-list cell.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_linklist_get(
    table: Handle,
    column: usize,
    row: usize,
    index: usize,
    out_row: *mut usize,
) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = registry().with_table(table, |id, g| {
            let targets = g.table(id)?.get_link_list(column, row)?;
            targets.get(index).copied().ok_or_else(|| {
                tablink_core::CoreError::RowOutOfRange {
                    row: index,
                    size: targets.len(),
                }
                .into()
            })
        })?;
        Ok(())
    })
}

/// Clears a cell of a nullable column, or a link cell.
#[no_mangle]
pub extern "C" fn tl_table_set_null(table: Handle, column: usize, row: usize) -> TlResult {
    status(|| set(table, column, row, Value::Null))
}

/// Signals whether a cell is null.
#[no_mangle]
pub extern "C" fn tl_table_is_null(table: Handle, column: usize, row: usize) -> isize {
    signal(|| registry().with_table(table, |id, g| Ok(g.table(id)?.is_null(column, row)?)))
}

/// Starts an empty query over the table.
///
/// # Arguments
///
/// * `table` - The table handle
/// * `out_query` - Output for the query handle (caller owns it)
///
/// # Safety
///
/// `out_query` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_where(table: Handle, out_query: *mut Handle) -> TlResult {
    status(|| {
        let out_query = out(out_query, "out_query")?;
        *out_query = NULL_HANDLE;
        let mut registry = registry();
        let table_ref = registry.table(table)?;
        registry.with_table(table, |id, g| g.table(id).map(drop).map_err(FfiError::from))?;
        *out_query = registry.insert(Object::Query(QueryRef {
            group: table_ref.group,
            query: Query::new(table_ref.table),
        }));
        Ok(())
    })
}

/// Creates a view of the rows with distinct values in `column`.
///
/// # Safety
///
/// `out_view` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_table_distinct(
    table: Handle,
    column: usize,
    out_view: *mut Handle,
) -> TlResult {
    status(|| {
        let out_view = out(out_view, "out_view")?;
        *out_view = NULL_HANDLE;
        let mut registry = registry();
        let table_ref = registry.table(table)?;
        let view = registry.with_table(table, |id, g| {
            let mut view = Query::new(id).find_all(g, Range::ALL)?;
            view.distinct(g, column)?;
            Ok(view)
        })?;
        *out_view = registry.insert(Object::View(ViewRef {
            group: table_ref.group,
            view,
        }));
        Ok(())
    })
}

/// Destroys a table handle. The table itself is unaffected.
#[no_mangle]
pub extern "C" fn tl_table_destroy(table: Handle) -> TlResult {
    status(|| registry().remove_table(table))
}
