#![deny(missing_docs)]
//! An in-memory, sharded key/value store backed by an append-only log.
//!
//! Writes go to a per-shard binary log; the entire dataset is expected to
//! fit in memory, and durability comes from periodic [`Store::snapshot`]
//! calls rather than per-write fsync. [`Store::restore`] replays a snapshot
//! stream back into a store with an identical key/value mapping.
//!
//! ```rust
//! use shard_wal_kv::{Store, Value};
//!
//! let store = Store::new();
//! store.set("key", Value::from("value"));
//! assert_eq!(store.get("key"), Some(Value::from("value")));
//! ```

pub use error::{Error, Result};
pub use options::StoreOptions;
pub use store::Store;
pub use value::Value;

pub mod diagnostics;
pub mod hash;
pub mod pool;

mod codec;
mod error;
mod log;
mod options;
mod shard;
mod snapshot;
mod store;
mod value;
