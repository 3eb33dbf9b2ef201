//! The shard fabric: a fixed-size array of independent logs selected by a
//! hash of the key, each guarded by its own reader-writer lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::RwLock;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::hash::HashFn;
use crate::log::Log;
use crate::snapshot;

/// One shard: a log plus the atomic flag used to reject re-entrant
/// compaction without blocking on the log's lock.
struct Shard {
    log: RwLock<Log>,
    compacting: AtomicBool,
}

impl Shard {
    fn new(initial_log_size: usize, initial_index_size: usize) -> Self {
        Shard {
            log: RwLock::new(Log::new(initial_log_size, initial_index_size)),
            compacting: AtomicBool::new(false),
        }
    }

    fn from_log(log: Log) -> Self {
        Shard {
            log: RwLock::new(log),
            compacting: AtomicBool::new(false),
        }
    }

    /// Compaction holds the log's exclusive lock for its whole duration.
    /// The `compacting` flag is set with a CAS ahead of acquiring that
    /// lock, so a second concurrent caller fails fast with
    /// `CompactAlreadyRunning` instead of queueing behind the lock.
    fn compact(&self) -> Result<()> {
        if self
            .compacting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::CompactAlreadyRunning);
        }
        let result = self.log.write().unwrap().compact();
        self.compacting.store(false, Ordering::Release);
        result
    }
}

/// Holds `N` independent logs and routes keys to one of them by hash.
/// `N` is fixed at construction; restoring a snapshot taken with a
/// different shard count produces a store with the snapshot's own count
/// (see [`ShardFabric::restore`]).
pub struct ShardFabric {
    shards: Vec<Shard>,
    hash_fn: Arc<dyn HashFn>,
}

impl ShardFabric {
    /// Builds an empty fabric of `shard_count` logs.
    pub fn new(
        shard_count: usize,
        initial_log_size: usize,
        initial_index_size: usize,
        hash_fn: Arc<dyn HashFn>,
    ) -> Self {
        let shards = (0..shard_count)
            .map(|_| Shard::new(initial_log_size, initial_index_size))
            .collect();
        ShardFabric { shards, hash_fn }
    }

    /// Number of shards in this fabric.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the index of the shard that owns `key`: `hash(key) mod N`,
    /// computed over an unsigned 64-bit value so the result is stable
    /// across process lifetimes for a fixed hash function and shard count.
    pub fn shard_index(&self, key: &[u8]) -> usize {
        (self.hash_fn.hash64(key) % self.shards.len() as u64) as usize
    }

    fn shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Appends `key → value` to its shard's log.
    pub fn write(&self, key: &[u8], value: &[u8]) {
        self.shard(key).log.write().unwrap().write(key, value);
    }

    /// Reads the current value for `key`, if present.
    pub fn read(&self, key: &[u8]) -> Result<Option<Bytes>> {
        self.shard(key).log.read().unwrap().read(key)
    }

    /// Removes `key`, returning its last value if present.
    pub fn delete(&self, key: &[u8]) -> Result<Option<Bytes>> {
        self.shard(key).log.write().unwrap().delete(key)
    }

    /// Runs `f` under the exclusive lock of `key`'s shard, with the
    /// current `(value, present)` as input. Used to implement the
    /// façade's atomic-per-key composite operations.
    pub fn with_exclusive<R>(
        &self,
        key: &[u8],
        f: impl FnOnce(&mut Log) -> Result<R>,
    ) -> Result<R> {
        let mut log = self.shard(key).log.write().unwrap();
        f(&mut log)
    }

    /// Total live keys across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.log.read().unwrap().len()).sum()
    }

    /// True when every shard is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The union of every shard's key set, in unspecified order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        for shard in &self.shards {
            keys.extend(shard.log.read().unwrap().keys());
        }
        keys
    }

    /// Sum of every shard's buffer size.
    pub fn size(&self) -> u64 {
        self.shards.iter().map(|s| s.log.read().unwrap().size()).sum()
    }

    /// Sum of every shard's reclaimable counter.
    pub fn reclaimable_space(&self) -> u64 {
        self.shards
            .iter()
            .map(|s| s.log.read().unwrap().reclaimable_space())
            .sum()
    }

    /// Compacts every shard in turn; aborts the sweep and propagates the
    /// first failure (typically `CompactAlreadyRunning`).
    pub fn compact(&self) -> Result<()> {
        for shard in &self.shards {
            shard.compact()?;
        }
        Ok(())
    }

    /// Writes the top-level snapshot stream: a shard count followed by
    /// each shard's length-prefixed raw log buffer.
    pub fn snapshot(&self, w: &mut impl std::io::Write) -> Result<()> {
        snapshot::write_u64(w, self.shards.len() as u64)?;
        for shard in &self.shards {
            let log = shard.log.read().unwrap();
            let mut blob = Vec::new();
            log.snapshot(&mut blob)?;
            snapshot::write_u64(w, blob.len() as u64)?;
            w.write_all(&blob)?;
        }
        Ok(())
    }

    /// Rebuilds a fabric from a stream written by [`ShardFabric::snapshot`].
    /// The shard count is read from the stream itself, not from `opts`; the
    /// resulting fabric uses exactly that many shards, so it only behaves
    /// like the original store when restored with the same hash function.
    pub fn restore(
        r: &mut impl std::io::Read,
        initial_index_size: usize,
        hash_fn: Arc<dyn HashFn>,
    ) -> Result<Self> {
        let shard_count = snapshot::read_u64(r)? as usize;
        let mut shards = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            let blob_size = snapshot::read_u64(r)? as usize;
            let mut blob = vec![0u8; blob_size];
            snapshot::read_exact_or_truncated(r, &mut blob)?;
            let log = Log::restore(&blob, initial_index_size)?;
            shards.push(Shard::from_log(log));
        }
        Ok(ShardFabric { shards, hash_fn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::default_hash_fn;

    fn fabric(shard_count: usize) -> ShardFabric {
        ShardFabric::new(shard_count, 1024, 16, default_hash_fn())
    }

    #[test]
    fn routes_consistently_across_calls() {
        let f = fabric(1024);
        let idx1 = f.shard_index(b"test1");
        let idx2 = f.shard_index(b"test1");
        assert_eq!(idx1, idx2);
    }

    #[test]
    fn len_equals_keys_len() {
        let f = fabric(8);
        for i in 0..50 {
            f.write(format!("k{i}").as_bytes(), b"v");
        }
        assert_eq!(f.len(), f.keys().len());
        assert_eq!(f.len(), 50);
    }

    #[test]
    fn snapshot_restore_preserves_every_key() {
        let f = fabric(4);
        for i in 1..=5 {
            f.write(format!("test{i}").as_bytes(), format!("value{i}").as_bytes());
        }

        let mut buf = Vec::new();
        f.snapshot(&mut buf).unwrap();

        let restored = ShardFabric::restore(&mut &buf[..], 16, default_hash_fn()).unwrap();
        for i in 1..=5 {
            let key = format!("test{i}");
            assert_eq!(
                restored.read(key.as_bytes()).unwrap().unwrap(),
                Bytes::from(format!("value{i}"))
            );
        }
    }

    #[test]
    fn double_compact_rejects_concurrent_attempt() {
        use std::sync::Barrier;
        use std::thread;

        let f = Arc::new(fabric(1));
        for i in 0..1000 {
            f.write(format!("k{i}").as_bytes(), b"v");
        }
        for i in 0..500 {
            f.delete(format!("k{i}").as_bytes()).unwrap();
        }

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                f.compact()
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        let err_count = results
            .iter()
            .filter(|r| matches!(r, Err(Error::CompactAlreadyRunning)))
            .count();
        assert_eq!(ok_count, 1);
        assert_eq!(err_count, 1);
        assert_eq!(f.reclaimable_space(), 0);
    }
}
