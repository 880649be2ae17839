//! View FFI functions.
//!
//! A view holds row indices into one table. Reads go through the owning
//! group's current state; a row removed since materialization reads as out
//! of range.

use crate::call::{out, signal, size, status, text_out};
use crate::error::TlResult;
use crate::handles::{registry, Handle};
use tablink_core::Value;
use tablink_query::QueryError;

/// Returns the number of rows in the view.
///
/// # Safety
///
/// `out_size` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_view_size(view: Handle, out_size: *mut usize) -> TlResult {
    status(|| {
        let out_size = out(out_size, "out_size")?;
        *out_size = registry().with_view(view, |v, _| Ok(v.size()))?;
        Ok(())
    })
}

/// Signals whether the view has no rows.
#[no_mangle]
pub extern "C" fn tl_view_is_empty(view: Handle) -> isize {
    signal(|| registry().with_view(view, |v, _| Ok(v.is_empty())))
}

/// Maps a view position to its table row.
///
/// # Safety
///
/// `out_row` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_view_get_source_row(
    view: Handle,
    index: usize,
    out_row: *mut usize,
) -> TlResult {
    status(|| {
        let out_row = out(out_row, "out_row")?;
        *out_row = registry().with_view(view, |v, _| Ok(v.source_row(index)?))?;
        Ok(())
    })
}

/// Copies a string cell at view position `index`. Null cells copy as empty.
///
/// # Returns
///
/// Units written; a larger capacity to retry with; or a negative code.
///
/// # Safety
///
/// `buffer` must be valid for `capacity` units.
#[no_mangle]
pub unsafe extern "C" fn tl_view_get_string(
    view: Handle,
    column: usize,
    index: usize,
    buffer: *mut u16,
    capacity: usize,
) -> isize {
    size(|| {
        registry().with_view(view, |v, g| match v.get(g, column, index)? {
            Value::String(s) => text_out(s, buffer, capacity),
            Value::Null => text_out("", buffer, capacity),
            other => Err(QueryError::type_mismatch(format!("expected a string, found {other:?}")).into()),
        })
    })
}

/// Reads an integer cell at view position `index`; null reads as zero.
///
/// # Safety
///
/// `out_value` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn tl_view_get_int(
    view: Handle,
    column: usize,
    index: usize,
    out_value: *mut i64,
) -> TlResult {
    status(|| {
        let out_value = out(out_value, "out_value")?;
        *out_value = registry().with_view(view, |v, g| match v.get(g, column, index)? {
            Value::Int(n) => Ok(*n),
            Value::Null => Ok(0),
            other => Err(QueryError::type_mismatch(format!("expected an integer, found {other:?}")).into()),
        })?;
        Ok(())
    })
}

/// Sorts the view in place by one column; the sort is stable.
#[no_mangle]
pub extern "C" fn tl_view_sort(view: Handle, column: usize, ascending: bool) -> TlResult {
    status(|| registry().with_view(view, |v, g| Ok(v.sort(g, column, ascending)?)))
}

/// Keeps the first row of each distinct value of `column`.
#[no_mangle]
pub extern "C" fn tl_view_distinct(view: Handle, column: usize) -> TlResult {
    status(|| registry().with_view(view, |v, g| Ok(v.distinct(g, column)?)))
}

/// Destroys a view handle.
#[no_mangle]
pub extern "C" fn tl_view_destroy(view: Handle) -> TlResult {
    status(|| registry().remove_view(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{tl_group_add_table, tl_group_begin_write, tl_group_destroy, tl_group_open};
    use crate::handles::NULL_HANDLE;
    use crate::query::{tl_query_destroy, tl_query_find_all};
    use crate::table::{
        tl_table_add_column, tl_table_add_empty_row, tl_table_destroy, tl_table_distinct,
        tl_table_remove_row, tl_table_set_int, tl_table_set_string, tl_table_where,
    };
    use tablink_core::DataKind;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    unsafe fn pets() -> (Handle, Handle) {
        let mut group = NULL_HANDLE;
        tl_group_open(std::ptr::null(), &mut group);
        tl_group_begin_write(group);
        let name = units("class_Pet");
        let mut table = NULL_HANDLE;
        tl_group_add_table(group, name.as_ptr(), name.len(), &mut table);
        let mut column = 0;
        for (kind, name) in [(DataKind::String, "Name"), (DataKind::Integer, "Legs")] {
            let name = units(name);
            tl_table_add_column(table, kind.code(), name.as_ptr(), name.len(), false, &mut column);
        }
        for (name, legs) in [("Rex", 4), ("Tweety", 2), ("Nemo", 0), ("Fido", 4)] {
            let mut row = 0;
            tl_table_add_empty_row(table, &mut row);
            let name = units(name);
            tl_table_set_string(table, 0, row, name.as_ptr(), name.len());
            tl_table_set_int(table, 1, row, legs);
        }
        (group, table)
    }

    unsafe fn all(table: Handle) -> (Handle, Handle) {
        let mut query = NULL_HANDLE;
        tl_table_where(table, &mut query);
        let mut view = NULL_HANDLE;
        assert_eq!(
            tl_query_find_all(query, 0, usize::MAX, usize::MAX, &mut view),
            TlResult::Ok
        );
        (query, view)
    }

    unsafe fn name_at(view: Handle, index: usize) -> String {
        let mut buffer = [0u16; 16];
        let len = tl_view_get_string(view, 0, index, buffer.as_mut_ptr(), buffer.len());
        assert!(len >= 0);
        String::from_utf16(&buffer[..len as usize]).unwrap()
    }

    #[test]
    fn sort_is_stable_and_reads_follow() {
        unsafe {
            let (group, table) = pets();
            let (query, view) = all(table);
            assert_eq!(tl_view_sort(view, 1, false), TlResult::Ok);
            let names: Vec<String> = (0..4).map(|i| name_at(view, i)).collect();
            assert_eq!(names, ["Rex", "Fido", "Tweety", "Nemo"]);

            let mut row = 0;
            tl_view_get_source_row(view, 1, &mut row);
            assert_eq!(row, 3);
            let mut legs = 0;
            tl_view_get_int(view, 1, 2, &mut legs);
            assert_eq!(legs, 2);
            assert_eq!(tl_view_get_int(view, 0, 2, &mut legs), TlResult::TypeMismatch);
            assert_eq!(tl_view_get_source_row(view, 4, &mut row), TlResult::OutOfRange);

            tl_view_destroy(view);
            tl_query_destroy(query);
            tl_table_destroy(table);
            tl_group_destroy(group);
        }
    }

    #[test]
    fn distinct_views() {
        unsafe {
            let (group, table) = pets();
            let mut view = NULL_HANDLE;
            assert_eq!(tl_table_distinct(table, 1, &mut view), TlResult::Ok);
            let mut size = 0;
            tl_view_size(view, &mut size);
            assert_eq!(size, 3);
            assert_eq!(name_at(view, 0), "Rex");
            assert_eq!(tl_view_is_empty(view), 0);
            tl_view_destroy(view);

            let (query, view) = all(table);
            assert_eq!(tl_view_distinct(view, 1), TlResult::Ok);
            tl_view_size(view, &mut size);
            assert_eq!(size, 3);
            tl_view_destroy(view);
            tl_query_destroy(query);
            tl_table_destroy(table);
            tl_group_destroy(group);
        }
    }

    #[test]
    fn removed_rows_read_out_of_range() {
        unsafe {
            let (group, table) = pets();
            let (query, view) = all(table);
            tl_table_remove_row(table, 0);
            tl_table_remove_row(table, 0);
            let mut legs = 0;
            assert_eq!(tl_view_get_int(view, 1, 0, &mut legs), TlResult::Ok);
            assert_eq!(tl_view_get_int(view, 1, 3, &mut legs), TlResult::OutOfRange);
            tl_view_destroy(view);
            assert_eq!(tl_view_destroy(view), TlResult::InvalidHandle);
            tl_query_destroy(query);
            tl_table_destroy(table);
            tl_group_destroy(group);
        }
    }
}
