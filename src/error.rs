use thiserror::Error;

/// Error type for the store.
#[derive(Error, Debug)]
pub enum Error {
    /// A log or snapshot stream ended in the middle of a record.
    #[error("truncated record")]
    Truncated,
    /// A compaction was requested on a shard that is already compacting.
    #[error("compaction already running")]
    CompactAlreadyRunning,
    /// A value could not be encoded into its on-log byte payload.
    #[error("value encode failure: {0}")]
    EncodeFailure(#[source] bincode::Error),
    /// A stored byte payload could not be decoded back into a value.
    #[error("value decode failure: {0}")]
    DecodeFailure(#[source] bincode::Error),
    /// The underlying reader/writer failed.
    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type for the store.
pub type Result<T> = std::result::Result<T, Error>;
