//! Engine-allocated byte buffers for binary cells.

use std::ptr;

/// Bytes of one binary cell, handed across the boundary by value.
///
/// A null `data` means the cell held no bytes. Anything else is owned by
/// the engine until passed back to [`tl_buffer_free`].
#[repr(C)]
#[derive(Debug)]
pub struct TlBuffer {
    /// First byte, or null.
    pub data: *mut u8,
    /// Byte count.
    pub len: usize,
}

impl TlBuffer {
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let len = bytes.len();
        let data = Box::into_raw(bytes.into_boxed_slice()).cast::<u8>();
        Self { data, len }
    }

    pub(crate) const fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
        }
    }
}

/// Releases the bytes of a binary cell read with `tl_table_get_binary`.
///
/// A buffer with null `data` is ignored.
///
/// # Safety
///
/// `buffer` must come from `tl_table_get_binary` unmodified and must not
/// have been freed already.
#[no_mangle]
pub unsafe extern "C" fn tl_buffer_free(buffer: TlBuffer) {
    if !buffer.data.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(buffer.data, buffer.len)));
    }
}
