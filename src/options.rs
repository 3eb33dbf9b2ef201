//! Store configuration: the tunable defaults and injectable collaborators
//! used to build a [`crate::Store`].

use std::sync::Arc;

use crate::diagnostics::{self, DiagnosticsSink};
use crate::hash::{self, HashFn};
use crate::pool::{BufferPool, DefaultBufferPool};

const DEFAULT_SHARD_COUNT: usize = 1024;
const DEFAULT_CACHE_CAPACITY: usize = 64;
const DEFAULT_LOG_SIZE: usize = 32 * 1024;
const DEFAULT_INDEX_SIZE: usize = 1024;

/// Tuning knobs and injectable collaborators for a [`crate::Store`].
///
/// Construct with [`StoreOptions::new`] and override with the builder
/// methods; each returns `Self` so calls chain.
pub struct StoreOptions {
    pub(crate) shard_count: usize,
    pub(crate) initial_cache_capacity: usize,
    pub(crate) initial_log_size: usize,
    pub(crate) initial_index_size: usize,
    pub(crate) hash_fn: Arc<dyn HashFn>,
    pub(crate) buffer_pool: Arc<dyn BufferPool>,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
}

impl StoreOptions {
    /// Defaults: 1024 shards, 64-entry cache capacity hint, 32 KiB log size
    /// hint, 1024-entry index size hint, XXH64-family hash, a
    /// `Mutex`-backed buffer pool, and a `log`-crate diagnostics sink.
    pub fn new() -> Self {
        StoreOptions {
            shard_count: DEFAULT_SHARD_COUNT,
            initial_cache_capacity: DEFAULT_CACHE_CAPACITY,
            initial_log_size: DEFAULT_LOG_SIZE,
            initial_index_size: DEFAULT_INDEX_SIZE,
            hash_fn: hash::default_hash_fn(),
            buffer_pool: Arc::new(DefaultBufferPool::new()),
            diagnostics: diagnostics::default_sink(),
        }
    }

    /// Sets the number of shards. Immutable once the store is built;
    /// changing the shard count after construction invalidates prior
    /// snapshots, since a key's shard is `hash(key) mod shard_count`.
    pub fn shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the per-shard index pre-allocation hint.
    pub fn initial_cache_capacity(mut self, capacity: usize) -> Self {
        self.initial_cache_capacity = capacity;
        self
    }

    /// Sets the per-shard buffer capacity hint in bytes.
    pub fn initial_log_size(mut self, size: usize) -> Self {
        self.initial_log_size = size;
        self
    }

    /// Sets the per-shard index map capacity hint.
    pub fn initial_index_size(mut self, size: usize) -> Self {
        self.initial_index_size = size;
        self
    }

    /// Injects a 64-bit string hash used for shard routing. Must be stable
    /// across process restarts for restore correctness.
    pub fn hash_fn(mut self, hash_fn: Arc<dyn HashFn>) -> Self {
        self.hash_fn = hash_fn;
        self
    }

    /// Injects the scratch-buffer pool used when encoding values.
    pub fn buffer_pool(mut self, pool: Arc<dyn BufferPool>) -> Self {
        self.buffer_pool = pool;
        self
    }

    /// Injects the sink that receives diagnostics for silently-swallowed
    /// `Set`/`Get`/`Remove` failures.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new()
    }
}
