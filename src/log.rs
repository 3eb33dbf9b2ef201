//! The append-only binary log: a growable byte buffer, a key→offset index,
//! reclamation accounting, and compaction.
//!
//! A `Log` carries no locking of its own; callers (the shard fabric) hold a
//! `RwLock<Log>` and decide shared vs. exclusive access per operation.

use std::collections::HashMap;
use std::io::Write;

use bytes::{Bytes, BytesMut};

use crate::codec;
use crate::error::Result;

/// An append-only log of length-framed `(key, value)` records plus the
/// index needed to read the latest value for a key in O(1).
pub struct Log {
    buf: BytesMut,
    index: HashMap<Vec<u8>, u64>,
    tail: u64,
    reclaimable: u64,
}

impl Log {
    /// Creates an empty log, pre-sizing its buffer and index from the given
    /// hints (`initial_log_size` in bytes, `initial_index_size` in entries).
    pub fn new(initial_log_size: usize, initial_index_size: usize) -> Self {
        Log {
            buf: BytesMut::with_capacity(initial_log_size),
            index: HashMap::with_capacity(initial_index_size),
            tail: 0,
            reclaimable: 0,
        }
    }

    /// Appends `key → value` to the log. If `key` was already present, the
    /// prior record becomes reclaimable.
    pub fn write(&mut self, key: &[u8], value: &[u8]) {
        let offset = self.tail;
        let new_tail = codec::encode(&mut self.buf, key, value);

        if let Some(&prev_offset) = self.index.get(key) {
            if let Ok((_, prev_value, _)) = codec::decode(&self.buf[prev_offset as usize..]) {
                self.reclaimable += codec::HEADER_SIZE + key.len() as u64 + prev_value.len() as u64;
            }
        }

        self.index.insert(key.to_vec(), offset);
        self.tail = new_tail;
    }

    /// Reads the current value for `key`, if present. Never mutates state.
    pub fn read(&self, key: &[u8]) -> Result<Option<Bytes>> {
        match self.index.get(key) {
            None => Ok(None),
            Some(&offset) => {
                let (_, value, _) = codec::decode(&self.buf[offset as usize..])?;
                Ok(Some(value))
            }
        }
    }

    /// Removes `key`, returning its last value if it was present. The bytes
    /// are not overwritten; they become reclaimable.
    pub fn delete(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let Some(offset) = self.index.remove(key) else {
            return Ok(None);
        };
        let (_, value, _) = codec::decode(&self.buf[offset as usize..])?;
        self.reclaimable += codec::HEADER_SIZE + key.len() as u64 + value.len() as u64;
        Ok(Some(value))
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when the log holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The current key set, in unspecified order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.index.keys().cloned().collect()
    }

    /// Total size in bytes of the underlying buffer.
    pub fn size(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Bytes in the buffer that belong to overwritten or deleted records.
    pub fn reclaimable_space(&self) -> u64 {
        self.reclaimable
    }

    /// Writes the raw buffer contents to `writer`. No framing is added; the
    /// caller (shard fabric) supplies the length prefix.
    pub fn snapshot<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.buf)?;
        Ok(())
    }

    /// Rebuilds the buffer from only the live records, in unspecified
    /// order, resetting `reclaimable` to zero.
    ///
    /// On a decode error mid-rebuild, state is left unchanged and the error
    /// is surfaced; `reclaimable` is not reset.
    pub fn compact(&mut self) -> Result<()> {
        let mut new_buf = BytesMut::with_capacity(self.buf.len());
        let mut new_index = HashMap::with_capacity(self.index.len());

        for (key, &offset) in self.index.iter() {
            let (_, value, _) = codec::decode(&self.buf[offset as usize..])?;
            let new_offset = new_buf.len() as u64;
            codec::encode(&mut new_buf, key, &value);
            new_index.insert(key.clone(), new_offset);
        }

        self.tail = new_buf.len() as u64;
        self.buf = new_buf;
        self.index = new_index;
        self.reclaimable = 0;
        Ok(())
    }

    /// Rebuilds a log from a stream of records written by [`Log::snapshot`].
    /// Records are replayed in physical order, so later records (overwrites)
    /// win, reproducing the latest value for each key.
    pub fn restore(blob: &[u8], initial_index_size: usize) -> Result<Self> {
        let mut log = Log::new(blob.len(), initial_index_size);
        let mut pos = 0usize;
        while pos < blob.len() {
            let (key, value, consumed) = codec::decode(&blob[pos..])?;
            log.write(&key, &value);
            pos += consumed;
        }
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn scalar_round_trip() {
        let mut log = Log::new(1024, 16);
        log.write(b"test1", b"value1");
        log.write(b"test2", &123456u64.to_be_bytes());

        assert_eq!(log.read(b"test1").unwrap().unwrap(), Bytes::from_static(b"value1"));
        assert_eq!(
            log.read(b"test2").unwrap().unwrap(),
            Bytes::copy_from_slice(&123456u64.to_be_bytes())
        );
        assert!(log.read(b"missing").unwrap().is_none());
    }

    #[test]
    fn overwrite_accounts_reclaimable_space() {
        let mut log = Log::new(1024, 16);
        log.write(b"k", b"aaaa");
        log.write(b"k", b"bbbbbbbb");

        assert_eq!(log.len(), 1);
        assert_eq!(log.read(b"k").unwrap().unwrap(), Bytes::from_static(b"bbbbbbbb"));
        assert_eq!(log.reclaimable_space(), codec::HEADER_SIZE + 1 + 4);
    }

    #[test]
    fn delete_then_compact_shrinks_buffer() {
        let mut log = Log::new(1024, 16);
        log.write(b"hello", b"hello");
        log.write(b"keyA", b"valueA");
        log.write(b"test", b"test");
        log.delete(b"keyA").unwrap();

        let before = log.size();
        log.compact().unwrap();

        assert!(log.size() < before);
        assert_eq!(log.reclaimable_space(), 0);
        assert_eq!(log.read(b"hello").unwrap().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(log.read(b"test").unwrap().unwrap(), Bytes::from_static(b"test"));
        assert!(log.read(b"keyA").unwrap().is_none());
    }

    #[test]
    fn compact_is_idempotent() {
        let mut log = Log::new(1024, 16);
        for i in 0..10 {
            log.write(format!("k{i}").as_bytes(), format!("v{i}").as_bytes());
        }
        log.delete(b"k3").unwrap();

        log.compact().unwrap();
        let size_after_first = log.size();
        log.compact().unwrap();

        assert_eq!(log.size(), size_after_first);
        assert_eq!(log.reclaimable_space(), 0);
        for i in 0..10 {
            if i == 3 {
                continue;
            }
            let key = format!("k{i}");
            assert_eq!(
                log.read(key.as_bytes()).unwrap().unwrap(),
                Bytes::from(format!("v{i}"))
            );
        }
    }

    #[test]
    fn delete_of_absent_key_is_noop() {
        let mut log = Log::new(64, 4);
        assert!(log.delete(b"nope").unwrap().is_none());
        assert_eq!(log.reclaimable_space(), 0);
    }

    #[test]
    fn snapshot_then_restore_round_trips() {
        let mut log = Log::new(1024, 16);
        for i in 1..=5 {
            log.write(format!("test{i}").as_bytes(), format!("value{i}").as_bytes());
        }

        let mut blob = Vec::new();
        log.snapshot(&mut blob).unwrap();

        let restored = Log::restore(&blob, 16).unwrap();
        for i in 1..=5 {
            let key = format!("test{i}");
            assert_eq!(
                restored.read(key.as_bytes()).unwrap().unwrap(),
                Bytes::from(format!("value{i}"))
            );
        }
    }

    #[test]
    fn restore_reproduces_latest_value_after_overwrite() {
        let mut log = Log::new(64, 4);
        log.write(b"k", b"old");
        log.write(b"k", b"new");

        let mut blob = Vec::new();
        log.snapshot(&mut blob).unwrap();

        let restored = Log::restore(&blob, 4).unwrap();
        assert_eq!(restored.read(b"k").unwrap().unwrap(), Bytes::from_static(b"new"));
        // The overwritten record is still physically present in the blob.
        assert!(restored.size() > log.size() - (codec::HEADER_SIZE + 1 + 3));
    }

    #[test]
    fn restore_of_truncated_blob_fails() {
        let mut log = Log::new(64, 4);
        log.write(b"k", b"value");
        let mut blob = Vec::new();
        log.snapshot(&mut blob).unwrap();
        blob.truncate(blob.len() - 1);

        assert!(matches!(Log::restore(&blob, 4), Err(Error::Truncated)));
    }
}
