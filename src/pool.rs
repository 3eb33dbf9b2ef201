//! Injectable scratch-buffer pool for value encoding.
//!
//! This is a local optimization, not part of the store's observable
//! contract: any implementation that hands back an empty buffer on `get`
//! and accepts any buffer on `put` is correct.

use std::sync::Mutex;

use bytes::BytesMut;

/// Default capacity for a freshly allocated scratch buffer.
const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// A pool of reusable scratch buffers for encoding values before they are
/// appended to a log. Implementations must be safe under concurrent access
/// from multiple shard locks at once.
pub trait BufferPool: Send + Sync {
    /// Borrows a cleared buffer from the pool, allocating one if empty.
    fn get(&self) -> BytesMut;
    /// Returns a buffer to the pool for reuse.
    fn put(&self, buf: BytesMut);
}

/// The default buffer pool: a `Mutex`-guarded free list.
pub struct DefaultBufferPool {
    free: Mutex<Vec<BytesMut>>,
}

impl DefaultBufferPool {
    /// Creates an empty pool; buffers are allocated lazily on first `get`.
    pub fn new() -> Self {
        DefaultBufferPool {
            free: Mutex::new(Vec::new()),
        }
    }
}

impl Default for DefaultBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool for DefaultBufferPool {
    fn get(&self) -> BytesMut {
        let mut free = self.free.lock().unwrap();
        free.pop()
            .unwrap_or_else(|| BytesMut::with_capacity(DEFAULT_BUFFER_SIZE))
    }

    fn put(&self, mut buf: BytesMut) {
        buf.clear();
        self.free.lock().unwrap().push(buf);
    }
}
