//! The hash function used to route keys to shards.
//!
//! Restore correctness depends on a hash that is stable across process
//! lifetimes: never plug in a hash seeded per-process.

use std::fmt;
use std::sync::Arc;

use twox_hash::XxHash64;

/// A stable 64-bit hash over byte slices, used to pick a key's shard.
pub trait HashFn: Send + Sync {
    /// Hashes `key` to a `u64`. Must be deterministic across calls and
    /// across process restarts for the same bytes.
    fn hash64(&self, key: &[u8]) -> u64;
}

impl fmt::Debug for dyn HashFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashFn")
    }
}

/// The default hash: a fixed-seed XXH64, a stable non-cryptographic 64-bit
/// hash suitable for shard routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxHash64Fn;

/// Seed used for the default hasher. Fixed so routing is reproducible
/// across restarts of the same process or a different one.
const DEFAULT_SEED: u64 = 0;

impl HashFn for XxHash64Fn {
    fn hash64(&self, key: &[u8]) -> u64 {
        use std::hash::Hasher;
        let mut hasher = XxHash64::with_seed(DEFAULT_SEED);
        hasher.write(key);
        hasher.finish()
    }
}

/// Returns the default injectable hash function.
pub fn default_hash_fn() -> Arc<dyn HashFn> {
    Arc::new(XxHash64Fn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_stable_across_calls() {
        let hash_fn = XxHash64Fn;
        assert_eq!(hash_fn.hash64(b"test1"), hash_fn.hash64(b"test1"));
    }

    #[test]
    fn differs_for_different_keys() {
        let hash_fn = XxHash64Fn;
        assert_ne!(hash_fn.hash64(b"test1"), hash_fn.hash64(b"test2"));
    }
}
