//! Query FFI functions: building, composing and materializing filters.
//!
//! A query handle belongs to the group of the table it was started on and
//! always evaluates against that group's current state.

use crate::call::{out, signal, slice, status, text_arg};
use crate::error::{FfiError, FfiResult, TlResult};
use crate::handles::{registry, Handle, Object, ViewRef, NULL_HANDLE};
use tablink_core::{Timestamp, Value, NOT_FOUND};
use tablink_query::{Aggregate, CompareOp, LinkChain, Range, SortDescriptor};

fn op_arg(code: u32) -> FfiResult<CompareOp> {
    CompareOp::from_code(code).ok_or(FfiError::UnknownCode {
        what: "comparison operator",
        code,
    })
}

/// Decodes an aggregate code: 0 sum, 1 min, 2 max, 3 average.
fn aggregate_arg(code: u32) -> FfiResult<Aggregate> {
    Ok(match code {
        0 => Aggregate::Sum,
        1 => Aggregate::Min,
        2 => Aggregate::Max,
        3 => Aggregate::Average,
        _ => {
            return Err(FfiError::UnknownCode {
                what: "aggregate function",
                code,
            })
        }
    })
}

unsafe fn chain_arg(chain: *const usize, chain_len: usize) -> FfiResult<LinkChain> {
    Ok(LinkChain::new(slice(chain, chain_len, "link_chain")?.to_vec()))
}

fn compare(
    query: Handle,
    column: usize,
    op: u32,
    operand: Value,
    case_sensitive: bool,
) -> FfiResult<()> {
    let op = op_arg(op)?;
    registry().with_query(query, |q, g| {
        Ok(q.compare(g, column, op, operand, case_sensitive)?)
    })
}

fn link_compare(
    query: Handle,
    chain: LinkChain,
    column: usize,
    op: u32,
    operand: Value,
    case_sensitive: bool,
) -> FfiResult<()> {
    let op = op_arg(op)?;
    registry().with_query(query, |q, g| {
        Ok(q.link_compare(g, &chain, column, op, operand, case_sensitive)?)
    })
}

/// Adds a comparison against a 64-bit integer.
///
/// # Arguments
///
/// * `query` - The query handle
/// * `column` - Column index in the query's table
/// * `op` - Comparison operator code
/// * `value` - Operand
#[no_mangle]
pub extern "C" fn tl_query_add_int_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: i64,
) -> TlResult {
    status(|| compare(query, column, op, Value::Int(value), true))
}

/// Adds a comparison against a 32-bit integer, sign-extended.
#[no_mangle]
pub extern "C" fn tl_query_add_int32_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: i32,
) -> TlResult {
    status(|| compare(query, column, op, Value::Int(i64::from(value)), true))
}

/// Adds a comparison against a float.
#[no_mangle]
pub extern "C" fn tl_query_add_float_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: f32,
) -> TlResult {
    status(|| compare(query, column, op, Value::Float(value), true))
}

/// Adds a comparison against a double.
#[no_mangle]
pub extern "C" fn tl_query_add_double_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: f64,
) -> TlResult {
    status(|| compare(query, column, op, Value::Double(value), true))
}

/// Adds an equality comparison against a boolean.
#[no_mangle]
pub extern "C" fn tl_query_add_bool_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: bool,
) -> TlResult {
    status(|| compare(query, column, op, Value::Bool(value), true))
}

/// Adds a comparison against a timestamp given as ticks.
#[no_mangle]
pub extern "C" fn tl_query_add_timestamp_ticks_comparison(
    query: Handle,
    column: usize,
    op: u32,
    ticks: i64,
) -> TlResult {
    status(|| {
        let operand = Value::Timestamp(Timestamp::from_ticks(ticks));
        compare(query, column, op, operand, true)
    })
}

/// Adds a comparison against a UTF-16 string.
///
/// # Arguments
///
/// * `query` - The query handle
/// * `column` - Column index in the query's table
/// * `op` - Comparison operator code
/// * `value` / `value_len` - UTF-16 operand
/// * `case_sensitive` - False folds both sides to lowercase
///
/// # Safety
///
/// `value` must point to `value_len` units.
#[no_mangle]
pub unsafe extern "C" fn tl_query_add_string_comparison(
    query: Handle,
    column: usize,
    op: u32,
    value: *const u16,
    value_len: usize,
    case_sensitive: bool,
) -> TlResult {
    status(|| {
        let text = text_arg(value, value_len, "value")?;
        compare(query, column, op, Value::String(text), case_sensitive)
    })
}

/// Adds a comparison against a byte string. `case_sensitive` must be true.
///
/// # Safety
///
/// `data` must point to `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn tl_query_add_binary_comparison(
    query: Handle,
    column: usize,
    op: u32,
    data: *const u8,
    len: usize,
    case_sensitive: bool,
) -> TlResult {
    status(|| {
        let bytes = slice(data, len, "data")?.to_vec();
        compare(query, column, op, Value::Binary(bytes), case_sensitive)
    })
}

/// Matches rows whose link column points at `row`.
#[no_mangle]
pub extern "C" fn tl_query_links_to(query: Handle, column: usize, row: usize) -> TlResult {
    status(|| registry().with_query(query, |q, g| Ok(q.links_to(g, column, row)?)))
}

/// Adds a null (`is_null` true) or not-null test.
#[no_mangle]
pub extern "C" fn tl_query_add_null(query: Handle, column: usize, is_null: bool) -> TlResult {
    status(|| registry().with_query(query, |q, g| Ok(q.null(g, column, is_null)?)))
}

/// Adds an inclusive range test on an integer column.
#[no_mangle]
pub extern "C" fn tl_query_int_between(
    query: Handle,
    column: usize,
    low: i64,
    high: i64,
) -> TlResult {
    status(|| registry().with_query(query, |q, g| Ok(q.between(g, column, low, high)?)))
}

/// Adds a string comparison on a column reached through link columns.
///
/// # Arguments
///
/// * `query` - The query handle
/// * `chain` / `chain_len` - Link column indices, one per hop
/// * `column` - Column index in the table at the end of the chain
/// * `op` - Comparison operator code
/// * `value` / `value_len` - UTF-16 operand
/// * `case_sensitive` - False folds both sides to lowercase
///
/// # Safety
///
/// - `chain` must point to `chain_len` indices
/// - `value` must point to `value_len` units
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_string_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: *const u16,
    value_len: usize,
    case_sensitive: bool,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        let text = text_arg(value, value_len, "value")?;
        link_compare(query, chain, column, op, Value::String(text), case_sensitive)
    })
}

/// Adds a 32-bit integer comparison through link columns.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_int_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: i32,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        link_compare(query, chain, column, op, Value::Int(i64::from(value)), true)
    })
}

/// Adds a 64-bit integer comparison through link columns.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_long_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: i64,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        link_compare(query, chain, column, op, Value::Int(value), true)
    })
}

/// Adds a double comparison through link columns.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_double_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: f64,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        link_compare(query, chain, column, op, Value::Double(value), true)
    })
}

/// Adds a float comparison through link columns.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_float_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: f32,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        link_compare(query, chain, column, op, Value::Float(value), true)
    })
}

/// Adds a boolean comparison through link columns.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_bool_comparison(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    op: u32,
    value: bool,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        link_compare(query, chain, column, op, Value::Bool(value), true)
    })
}

unsafe fn link_null(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
    is_null: bool,
) -> TlResult {
    status(|| {
        let chain = chain_arg(chain, chain_len)?;
        registry().with_query(query, |q, g| Ok(q.link_null(g, &chain, column, is_null)?))
    })
}

/// Matches rows where the column reached through `chain` is null.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_null_equal(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
) -> TlResult {
    link_null(query, chain, chain_len, column, true)
}

/// Matches rows where the column reached through `chain` is not null.
///
/// # Safety
///
/// `chain` must point to `chain_len` indices.
#[no_mangle]
pub unsafe extern "C" fn tl_query_link_add_null_not_equal(
    query: Handle,
    chain: *const usize,
    chain_len: usize,
    column: usize,
) -> TlResult {
    link_null(query, chain, chain_len, column, false)
}

/// Separates two alternatives.
#[no_mangle]
pub extern "C" fn tl_query_or(query: Handle) -> TlResult {
    status(|| registry().with_query(query, |q, _| Ok(q.or()?)))
}

/// Negates the next predicate or group.
#[no_mangle]
pub extern "C" fn tl_query_not(query: Handle) -> TlResult {
    status(|| registry().with_query(query, |q, _| Ok(q.not()?)))
}

/// Opens a group.
#[no_mangle]
pub extern "C" fn tl_query_group_begin(query: Handle) -> TlResult {
    status(|| registry().with_query(query, |q, _| Ok(q.group_begin()?)))
}

/// Closes the innermost open group.
#[no_mangle]
pub extern "C" fn tl_query_group_end(query: Handle) -> TlResult {
    status(|| registry().with_query(query, |q, _| Ok(q.group_end()?)))
}

/// ANDs `other` into `query` as one clause, sealing `other`.
///
/// Both queries must belong to the same group and table.
#[no_mangle]
pub extern "C" fn tl_query_and_query(query: Handle, other: Handle) -> TlResult {
    status(|| {
        let mut registry = registry();
        if registry.query_group(query)? != registry.query_group(other)? {
            return Err(tablink_query::QueryError::malformed(
                "cannot combine queries from different groups",
            )
            .into());
        }
        let mut sealed = registry.with_query(other, |q, _| {
            q.seal()?;
            Ok(q.clone())
        })?;
        registry.with_query(query, |q, _| Ok(q.and_query(&mut sealed)?))
    })
}

/// Returns the first matching row at or after `offset`, or `usize::MAX`.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_find(query: Handle, offset: usize, out_row: *mut usize) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = NOT_FOUND;
        *out_row = registry().with_query(query, |q, g| Ok(q.find(g, offset)?))?;
        Ok(())
    })
}

/// Returns the first matching row after `row`, or `usize::MAX`.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_find_next(query: Handle, row: usize, out_row: *mut usize) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = NOT_FOUND;
        *out_row = registry().with_query(query, |q, g| Ok(q.find_next(g, row)?))?;
        Ok(())
    })
}

/// Counts matching rows in `[start, end)`, stopping at `limit` matches.
///
/// `usize::MAX` for `end` or `limit` means unbounded.
///
/// # Safety
///
/// `out_count` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_count(
    query: Handle,
    start: usize,
    end: usize,
    limit: usize,
    out_count: *mut usize,
) -> TlResult {
    status(|| {
        let out_count = out(out_count, "out_count")?;
        let range = Range::new(start, end, limit);
        *out_count = registry().with_query(query, |q, g| Ok(q.count(g, range)?))?;
        Ok(())
    })
}

/// Collects matching rows in `[start, end)` into a view.
///
/// # Safety
///
/// `out_view` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_find_all(
    query: Handle,
    start: usize,
    end: usize,
    limit: usize,
    out_view: *mut Handle,
) -> TlResult {
    status(|| {
        let out_view = out(out_view, "out_view")?;
        *out_view = NULL_HANDLE;
        let range = Range::new(start, end, limit);
        let mut registry = registry();
        let group = registry.query_group(query)?;
        let view = registry.with_query(query, |q, g| Ok(q.find_all(g, range)?))?;
        *out_view = registry.insert(Object::View(ViewRef { group, view }));
        Ok(())
    })
}

/// Collects every matching row into a view ordered by property paths.
///
/// # Arguments
///
/// * `query` - The query handle
/// * `clause_count` - Number of sort clauses
/// * `path_lengths` - Property indices per clause (`clause_count` entries)
/// * `ascending` - Direction per clause (`clause_count` entries)
/// * `flattened` / `flattened_len` - Property indices of every path, in order
/// * `out_view` - Output for the view handle
///
/// # Safety
///
/// All arrays must be valid for their stated lengths and `out_view` must be
/// a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_find_all_sorted(
    query: Handle,
    clause_count: usize,
    path_lengths: *const usize,
    ascending: *const bool,
    flattened: *const usize,
    flattened_len: usize,
    out_view: *mut Handle,
) -> TlResult {
    status(|| {
        let out_view = out(out_view, "out_view")?;
        *out_view = NULL_HANDLE;
        let path_lengths = slice(path_lengths, clause_count, "path_lengths")?;
        let ascending = slice(ascending, clause_count, "ascending")?;
        let flattened = slice(flattened, flattened_len, "flattened")?;
        let mut registry = registry();
        let group = registry.query_group(query)?;
        let view = registry.with_query(query, |q, g| {
            let descriptor =
                SortDescriptor::unflatten(g, q.table(), path_lengths, ascending, flattened)?;
            Ok(q.find_all_sorted(g, &descriptor)?)
        })?;
        *out_view = registry.insert(Object::View(ViewRef { group, view }));
        Ok(())
    })
}

fn aggregate(query: Handle, column: usize, function: u32) -> FfiResult<Value> {
    let function = aggregate_arg(function)?;
    registry().with_query(query, |q, g| Ok(q.aggregate(g, column, function)?))
}

fn aggregate_mismatch(value: &Value, wanted: &str) -> FfiError {
    tablink_query::QueryError::type_mismatch(format!(
        "aggregate produced {}, not {wanted}",
        value.kind().map_or("null".to_string(), |k| k.to_string())
    ))
    .into()
}

/// Aggregates an integer column.
///
/// # Returns
///
/// 1 with the result written, 0 if no row contributed, or a negative code.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_aggregate_int(
    query: Handle,
    column: usize,
    function: u32,
    out_value: *mut i64,
) -> isize {
    signal(|| {
        let out_value = out(out_value, "out_value")?;
        match aggregate(query, column, function)? {
            Value::Null => Ok(false),
            Value::Int(v) => {
                *out_value = v;
                Ok(true)
            }
            other => Err(aggregate_mismatch(&other, "an integer")),
        }
    })
}

/// Aggregates a float, double or (for average) integer column.
///
/// # Returns
///
/// 1 with the result written, 0 if no row contributed, or a negative code.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_aggregate_double(
    query: Handle,
    column: usize,
    function: u32,
    out_value: *mut f64,
) -> isize {
    signal(|| {
        let out_value = out(out_value, "out_value")?;
        match aggregate(query, column, function)? {
            Value::Null => Ok(false),
            Value::Double(v) => {
                *out_value = v;
                Ok(true)
            }
            Value::Float(v) => {
                *out_value = f64::from(v);
                Ok(true)
            }
            other => Err(aggregate_mismatch(&other, "a floating value")),
        }
    })
}

/// Takes the minimum or maximum of a timestamp column, as ticks.
///
/// # Returns
///
/// 1 with the result written, 0 if no row contributed, or a negative code.
///
/// # Safety
///
/// `out_ticks` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_query_aggregate_timestamp(
    query: Handle,
    column: usize,
    function: u32,
    out_ticks: *mut i64,
) -> isize {
    signal(|| {
        let out_ticks = out(out_ticks, "out_ticks")?;
        match aggregate(query, column, function)? {
            Value::Null => Ok(false),
            Value::Timestamp(t) => {
                *out_ticks = t.to_ticks();
                Ok(true)
            }
            other => Err(aggregate_mismatch(&other, "a timestamp")),
        }
    })
}

/// Looks up a column of the query's table; writes `usize::MAX` if absent.
///
/// # Safety
///
/// - `name` must point to `name_len` units
/// - `out_column` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn tl_query_column_index(
    query: Handle,
    name: *const u16,
    name_len: usize,
    out_column: *mut usize,
) -> TlResult {
    status(|| {
        let out_column = out(out_column, "out_column")?;
        let name = text_arg(name, name_len, "name")?;
        *out_column = registry()
            .with_query(query, |q, g| Ok(q.column_index(g, &name)?))?
            .unwrap_or(NOT_FOUND);
        Ok(())
    })
}

/// Destroys a query handle.
#[no_mangle]
pub extern "C" fn tl_query_destroy(query: Handle) -> TlResult {
    status(|| registry().remove_query(query))
}
