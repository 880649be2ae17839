//! Shared plumbing for exported functions: panic containment, error
//! reporting and pointer arguments.

use crate::error::{clear_last_error, report, FfiError, FfiResult, TlResult};
use crate::text;
use std::panic::{catch_unwind, AssertUnwindSafe};

fn contain<T>(f: impl FnOnce() -> FfiResult<T>) -> FfiResult<T> {
    clear_last_error();
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_owned());
        Err(FfiError::Panic(message))
    })
}

/// Runs a call that answers with a result code.
pub(crate) fn status(f: impl FnOnce() -> FfiResult<()>) -> TlResult {
    match contain(f) {
        Ok(()) => TlResult::Ok,
        Err(err) => report(&err),
    }
}

/// Runs a yes/no call on the signal channel.
pub(crate) fn signal(f: impl FnOnce() -> FfiResult<bool>) -> isize {
    crate::signal::from_result(contain(f).map_err(|err| report(&err)))
}

/// Runs a call answering with a non-negative size, or a negative code.
pub(crate) fn size(f: impl FnOnce() -> FfiResult<isize>) -> isize {
    match contain(f) {
        Ok(n) => n,
        Err(err) => report(&err) as isize,
    }
}

/// Borrows an out-pointer.
pub(crate) unsafe fn out<'a, T>(ptr: *mut T, name: &'static str) -> FfiResult<&'a mut T> {
    ptr.as_mut().ok_or(FfiError::NullPointer(name))
}

/// Borrows a `(pointer, length)` input; a zero length never reads the pointer.
pub(crate) unsafe fn slice<'a, T>(ptr: *const T, len: usize, name: &'static str) -> FfiResult<&'a [T]> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(FfiError::NullPointer(name));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}

/// Decodes a UTF-16 text argument.
pub(crate) unsafe fn text_arg(ptr: *const u16, len: usize, name: &'static str) -> FfiResult<String> {
    Ok(text::decode(slice(ptr, len, name)?)?)
}

/// Encodes engine text into a caller buffer of `capacity` units.
pub(crate) unsafe fn text_out(value: &str, buffer: *mut u16, capacity: usize) -> FfiResult<isize> {
    let units: &mut [u16] = if capacity == 0 {
        Default::default()
    } else if buffer.is_null() {
        return Err(FfiError::NullPointer("buffer"));
    } else {
        std::slice::from_raw_parts_mut(buffer, capacity)
    };
    Ok(text::encode(value.as_bytes(), units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::tl_get_last_error;

    #[test]
    fn panics_become_storage_failures() {
        let code = status(|| panic!("boom"));
        assert_eq!(code, TlResult::StorageFailure);
        assert!(!tl_get_last_error().is_null());
    }

    #[test]
    fn zero_length_ignores_null() {
        let units = unsafe { slice::<u16>(std::ptr::null(), 0, "name") }.unwrap();
        assert!(units.is_empty());
        assert!(matches!(
            unsafe { slice::<u16>(std::ptr::null(), 3, "name") },
            Err(FfiError::NullPointer("name"))
        ));
    }

    #[test]
    fn size_reports_negative_codes() {
        assert_eq!(size(|| Err(FfiError::ReadOnly("table"))), TlResult::ReadOnly as isize);
        assert_eq!(signal(|| Ok(true)), 1);
    }
}
