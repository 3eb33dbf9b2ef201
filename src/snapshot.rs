//! Top-level snapshot stream framing.
//!
//! ```text
//! ShardCount: u64 BE
//! repeat ShardCount times:
//!   BlobSize:   u64 BE
//!   Blob:       BlobSize bytes   -- the shard's raw log buffer
//! ```
//!
//! There is intentionally no magic number and no version field: the format
//! is bit-exact with what earlier snapshots already look like, at the cost
//! of silent incompatibility across shard counts (see DESIGN.md).

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Writes a `u64` big-endian length prefix.
pub fn write_u64(w: &mut impl Write, value: u64) -> Result<()> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Reads a `u64` big-endian length prefix, failing with `Truncated` on a
/// short read.
pub fn read_u64(r: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact_or_truncated(r, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Like `Read::read_exact`, but maps any failure (including a clean EOF
/// partway through) to `Error::Truncated` rather than an IO error.
pub fn read_exact_or_truncated(r: &mut impl Read, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(Error::Truncated);
        }
        filled += n;
    }
    Ok(())
}
