//! Tri-state results on a single integer channel.
//!
//! Negative values are [`TlResult`] codes; `0` and `1` are booleans.

use crate::error::TlResult;

/// Encodes a boolean answer, letting a failure code win.
///
/// `error_code` is zero on success and negative otherwise.
pub fn encode(value: bool, error_code: i32) -> isize {
    if error_code != 0 {
        return error_code as isize;
    }
    isize::from(value)
}

/// Encodes the outcome of a fallible yes/no question.
pub fn from_result(result: Result<bool, TlResult>) -> isize {
    match result {
        Ok(value) => encode(value, 0),
        Err(code) => encode(false, code as i32),
    }
}

/// Decodes a signal back into a boolean or result code.
pub fn decode(signal: isize) -> Result<bool, TlResult> {
    match signal {
        0 => Ok(false),
        1 => Ok(true),
        code => Err(TlResult::from(code as i32)),
    }
}
