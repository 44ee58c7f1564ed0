//! Bounds-checked little-endian reads.

use crate::formats::pe::types::{PeError, Result};

#[inline]
fn read_le<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(PeError::TruncatedHeader {
            expected: offset.saturating_add(N),
            actual: data.len(),
        })
}

/// Read a `u16`, or report the header as truncated.
pub fn u16_at(data: &[u8], offset: usize) -> Result<u16> {
    read_le(data, offset).map(u16::from_le_bytes)
}

/// Read a `u32`, or report the header as truncated.
pub fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    read_le(data, offset).map(u32::from_le_bytes)
}

/// Read a `u64`, or report the header as truncated.
pub fn u64_at(data: &[u8], offset: usize) -> Result<u64> {
    read_le(data, offset).map(u64::from_le_bytes)
}

/// Check that `offset..offset + size` lies within `data_len`.
#[inline]
pub fn check_bounds(offset: usize, size: usize, data_len: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= data_len => Ok(()),
        _ => Err(PeError::TruncatedHeader {
            expected: offset.saturating_add(size),
            actual: data_len,
        }),
    }
}
