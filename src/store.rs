//! The public façade: map-shaped operations over the shard fabric, with the
//! correct lock taken around each one.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::options::StoreOptions;
use crate::pool::BufferPool;
use crate::shard::ShardFabric;
use crate::value::{self, Value};

/// A sharded, in-memory key/value store backed by an append-only log per
/// shard, with snapshot/restore and online compaction.
///
/// `Store` is cheap to clone: clones share the same shard fabric through an
/// `Arc`, so any clone observes every other clone's writes.
///
/// ```
/// use shard_wal_kv::{Store, Value};
///
/// let store = Store::new();
/// store.set("key", Value::from("value"));
/// assert_eq!(store.get("key"), Some(Value::from("value")));
/// ```
#[derive(Clone)]
pub struct Store {
    fabric: Arc<ShardFabric>,
    buffer_pool: Arc<dyn BufferPool>,
    diagnostics: Arc<dyn crate::diagnostics::DiagnosticsSink>,
}

impl Store {
    /// Builds an empty store with default options.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::new())
    }

    /// Builds an empty store tuned by `options`.
    pub fn with_options(options: StoreOptions) -> Self {
        let fabric = ShardFabric::new(
            options.shard_count,
            options.initial_log_size,
            options.initial_index_size,
            options.hash_fn,
        );
        Store {
            fabric: Arc::new(fabric),
            buffer_pool: options.buffer_pool,
            diagnostics: options.diagnostics,
        }
    }

    /// Inserts or overwrites `key`'s value. Silent on encode failure: the
    /// store is left logically unchanged and a diagnostic is reported.
    pub fn set<K: AsRef<[u8]>>(&self, key: K, value: Value) {
        let key = key.as_ref();
        match value::encode_pooled(self.buffer_pool.as_ref(), &value) {
            Ok(buf) => {
                self.fabric.write(key, &buf);
                self.buffer_pool.put(buf);
            }
            Err(err) => self.diagnostics.report("set", key, &err),
        }
    }

    /// Returns the current value for `key`, or `None` if absent or if the
    /// stored payload failed to decode (in which case a diagnostic is
    /// reported).
    pub fn get<K: AsRef<[u8]>>(&self, key: K) -> Option<Value> {
        let key = key.as_ref();
        match self.fabric.read(key) {
            Ok(None) => None,
            Ok(Some(bytes)) => match value::decode(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.diagnostics.report("get", key, &err);
                    None
                }
            },
            Err(err) => {
                self.diagnostics.report("get", key, &err);
                None
            }
        }
    }

    /// Removes `key`, returning its prior value if present (or `None` on
    /// decode failure, with a diagnostic reported).
    pub fn remove<K: AsRef<[u8]>>(&self, key: K) -> Option<Value> {
        let key = key.as_ref();
        match self.fabric.delete(key) {
            Ok(None) => None,
            Ok(Some(bytes)) => match value::decode(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    self.diagnostics.report("remove", key, &err);
                    None
                }
            },
            Err(err) => {
                self.diagnostics.report("remove", key, &err);
                None
            }
        }
    }

    /// Atomically updates `key`: runs `f(current)` under the shard's
    /// exclusive lock and writes back the result. `f` must not call back
    /// into the store — it executes while the shard is locked.
    ///
    /// Always returns the value `f` computed, even if the write that
    /// follows it fails to encode (in which case a diagnostic is reported
    /// and the store is left with `key`'s previous value, if any).
    pub fn upsert<K, F>(&self, key: K, f: F) -> Value
    where
        K: AsRef<[u8]>,
        F: FnOnce(Option<Value>) -> Value,
    {
        let key = key.as_ref();
        let mut new_value = None;
        let result = self.fabric.with_exclusive(key, |log| {
            let current = match log.read(key)? {
                Some(bytes) => match value::decode(&bytes) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        self.diagnostics.report("upsert", key, &err);
                        None
                    }
                },
                None => None,
            };
            let value = f(current);
            new_value = Some(value.clone());
            let encoded = value::encode_pooled(self.buffer_pool.as_ref(), &value)?;
            log.write(key, &encoded);
            self.buffer_pool.put(encoded);
            Ok(())
        });
        if let Err(err) = result {
            self.diagnostics.report("upsert", key, &err);
        }
        new_value.unwrap_or(Value::Null)
    }

    /// Sets `key` to `value` only if it is not already present. Returns
    /// `true` if the write happened; `false` if the key was already
    /// present or the write failed to encode (reported as a diagnostic).
    pub fn set_if_absent<K: AsRef<[u8]>>(&self, key: K, value: Value) -> bool {
        let key = key.as_ref();
        let result = self.fabric.with_exclusive(key, |log| {
            if log.read(key)?.is_some() {
                return Ok(false);
            }
            let encoded = value::encode_pooled(self.buffer_pool.as_ref(), &value)?;
            log.write(key, &encoded);
            self.buffer_pool.put(encoded);
            Ok(true)
        });
        match result {
            Ok(inserted) => inserted,
            Err(err) => {
                self.diagnostics.report("set_if_absent", key, &err);
                false
            }
        }
    }

    /// Removes `key` if `f(current)` returns `true`. Returns `true` if the
    /// key was removed.
    pub fn remove_if<K, F>(&self, key: K, f: F) -> bool
    where
        K: AsRef<[u8]>,
        F: FnOnce(Option<&Value>) -> bool,
    {
        let key = key.as_ref();
        let result = self.fabric.with_exclusive(key, |log| {
            let current = match log.read(key)? {
                Some(bytes) => match value::decode(&bytes) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        self.diagnostics.report("remove_if", key, &err);
                        None
                    }
                },
                None => None,
            };
            let present = current.is_some();
            let should_remove = f(current.as_ref());
            if should_remove && present {
                log.delete(key)?;
                Ok(true)
            } else {
                Ok(false)
            }
        });
        match result {
            Ok(removed) => removed,
            Err(err) => {
                self.diagnostics.report("remove_if", key, &err);
                false
            }
        }
    }

    /// Number of shards backing this store.
    pub fn shard_count(&self) -> usize {
        self.fabric.shard_count()
    }

    /// Total live keys across every shard.
    pub fn len(&self) -> usize {
        self.fabric.len()
    }

    /// True when the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.fabric.is_empty()
    }

    /// The union of every shard's key set, in unspecified order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.fabric.keys()
    }

    /// Sum of every shard's buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.fabric.size()
    }

    /// Sum of every shard's reclaimable byte counter.
    pub fn reclaimable_space(&self) -> u64 {
        self.fabric.reclaimable_space()
    }

    /// Compacts every shard in turn. Aborts on the first shard that fails
    /// (typically because it is already compacting) and propagates the
    /// error.
    pub fn compact(&self) -> Result<()> {
        self.fabric.compact()
    }

    /// Emits the top-level snapshot stream to `writer`. Not atomic across
    /// shards: it walks shards sequentially, each under its own shared
    /// lock, so concurrent writers to later shards may commit after
    /// earlier shards are captured.
    pub fn snapshot(&self, writer: &mut impl Write) -> Result<()> {
        self.fabric.snapshot(writer)
    }

    /// Builds a store from a snapshot stream written by [`Store::snapshot`],
    /// tuned by `options`. The shard count is read from the stream, not
    /// from `options`.
    pub fn restore(reader: &mut impl Read, options: StoreOptions) -> Result<Self> {
        let fabric = ShardFabric::restore(reader, options.initial_index_size, options.hash_fn)?;
        Ok(Store {
            fabric: Arc::new(fabric),
            buffer_pool: options.buffer_pool,
            diagnostics: options.diagnostics,
        })
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
