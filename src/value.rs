//! Self-describing value encoding.
//!
//! The log stores opaque byte payloads; the façade interposes this tagged
//! variant type so heterogeneous user values round-trip through
//! snapshot/restore without an external schema.

use std::collections::BTreeMap;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pool::BufferPool;

/// A self-describing value. Covers the scalar and composite shapes callers
/// typically store; values outside this set must be pre-encoded by the
/// caller into `Value::Bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value, distinct from a missing key.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    I64(i64),
    /// An unsigned 64-bit integer.
    U64(u64),
    /// A 64-bit float.
    F64(f64),
    /// A UTF-8 string.
    String(String),
    /// Opaque bytes.
    #[serde(with = "serde_bytes")]
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed map of values. `BTreeMap` keeps encoding
    /// deterministic, which matters for bit-exact snapshots.
    Map(BTreeMap<String, Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::U64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

/// Encodes a `Value` into its opaque on-log byte payload.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(Error::EncodeFailure)
}

/// Decodes a byte payload previously produced by [`encode`] back into a
/// `Value`.
pub fn decode(bytes: &[u8]) -> Result<Value> {
    bincode::deserialize(bytes).map_err(Error::DecodeFailure)
}

/// Encodes `value` into a scratch buffer borrowed from `pool`, returning the
/// buffer for the caller to read from and eventually return with
/// [`BufferPool::put`]. A pure performance path: the bytes produced are
/// identical to [`encode`]'s.
pub fn encode_pooled(pool: &dyn BufferPool, value: &Value) -> Result<BytesMut> {
    let mut buf = pool.get();
    bincode::serialize_into((&mut buf).writer(), value).map_err(Error::EncodeFailure)?;
    Ok(buf)
}
