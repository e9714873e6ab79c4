//! Error types for snapshot persistence

use thiserror::Error;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Snapshot store errors
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot written by an incompatible version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}
