//! UTF-16 caller buffers to and from UTF-8 engine strings.
//!
//! Decoding allocates once: short inputs reserve a fixed worst case, longer
//! inputs are scanned first for their exact UTF-8 length.
//!
//! Encoding negotiates size with the caller. The return value is the number
//! of units written, or, when it exceeds the buffer's capacity, the capacity
//! to retry with. Nothing is written in that case. `-1` means the source
//! bytes are not UTF-8.

use thiserror::Error;

/// Inputs of at most this many units skip the exact-length scan.
pub const SMALL_STRING_UNITS: usize = 48;

/// Bytes reserved per unit for short inputs.
const SMALL_STRING_BYTES_PER_UNIT: usize = 4;

/// Returned by [`encode`] for malformed UTF-8.
pub const MALFORMED: isize = -1;

/// Text conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// A surrogate without its partner.
    #[error("unpaired surrogate 0x{unit:04x} at unit {index}")]
    UnpairedSurrogate {
        /// Position of the surrogate.
        index: usize,
        /// The surrogate unit.
        unit: u16,
    },
}

/// Decodes UTF-16 units into an owned UTF-8 string.
pub fn decode(units: &[u16]) -> Result<String, TextError> {
    if units.is_empty() {
        return Ok(String::new());
    }
    let capacity = if units.len() <= SMALL_STRING_UNITS {
        units.len() * SMALL_STRING_BYTES_PER_UNIT
    } else {
        utf8_len(units)?
    };
    let mut out = String::with_capacity(capacity);
    for (index, decoded) in decode_indexed(units) {
        out.push(decoded.map_err(|unit| TextError::UnpairedSurrogate { index, unit })?);
    }
    Ok(out)
}

/// Returns the UTF-8 byte length `units` decode to.
pub fn utf8_len(units: &[u16]) -> Result<usize, TextError> {
    decode_indexed(units).try_fold(0, |len, (index, decoded)| {
        decoded
            .map(|c| len + c.len_utf8())
            .map_err(|unit| TextError::UnpairedSurrogate { index, unit })
    })
}

/// Returns the number of UTF-16 units `text` encodes to.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Encodes engine bytes into a caller buffer.
///
/// Returns the units written, a retry capacity larger than `buffer.len()`,
/// or [`MALFORMED`].
pub fn encode(bytes: &[u8], buffer: &mut [u16]) -> isize {
    let capacity = buffer.len();
    if bytes.len() > capacity {
        return bytes.len() as isize;
    }
    if bytes.is_empty() {
        return 0;
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        return MALFORMED;
    };
    let needed = utf16_len(text);
    if needed > capacity {
        return needed as isize;
    }
    for (slot, unit) in buffer.iter_mut().zip(text.encode_utf16()) {
        *slot = unit;
    }
    needed as isize
}

/// Pairs each decoded char with the index of its first unit; errors carry
/// the offending unit.
fn decode_indexed(units: &[u16]) -> impl Iterator<Item = (usize, Result<char, u16>)> + '_ {
    let mut index = 0;
    char::decode_utf16(units.iter().copied()).map(move |decoded| {
        let at = index;
        index += match &decoded {
            Ok(c) => c.len_utf16(),
            Err(_) => 1,
        };
        (at, decoded.map_err(|e| e.unpaired_surrogate()))
    })
}
