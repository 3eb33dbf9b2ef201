//! Length-framed record codec.
//!
//! A record on the log is `KeySize: u64 BE | ValueSize: u64 BE | key | value`.
//! The header is a fixed 16 bytes; there is no type tag and no checksum.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Size in bytes of a record header (two big-endian `u64` length fields).
pub const HEADER_SIZE: u64 = 16;

/// Appends one record to `out` and returns the offset one past its end
/// (the new tail, if `out` held exactly the log buffer before the call).
pub fn encode(out: &mut BytesMut, key: &[u8], value: &[u8]) -> u64 {
    out.reserve(HEADER_SIZE as usize + key.len() + value.len());
    out.put_u64(key.len() as u64);
    out.put_u64(value.len() as u64);
    out.put_slice(key);
    out.put_slice(value);
    out.len() as u64
}

/// Decodes one record starting at byte 0 of `input`, returning the key,
/// the value, and the number of bytes consumed.
///
/// `Truncated` is returned whenever `input` ends before a full record
/// (header or body) can be read; the format has no other failure mode.
pub fn decode(input: &[u8]) -> Result<(Bytes, Bytes, usize)> {
    if input.len() < HEADER_SIZE as usize {
        return Err(Error::Truncated);
    }
    let mut header = &input[..HEADER_SIZE as usize];
    let key_size = header.get_u64() as usize;
    let value_size = header.get_u64() as usize;

    let key_start = HEADER_SIZE as usize;
    let key_end = key_start + key_size;
    let value_end = key_end + value_size;
    if input.len() < value_end {
        return Err(Error::Truncated);
    }

    let key = Bytes::copy_from_slice(&input[key_start..key_end]);
    let value = Bytes::copy_from_slice(&input[key_end..value_end]);
    Ok((key, value, value_end))
}
