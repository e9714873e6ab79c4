//! Error types for the executor

use thiserror::Error;

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Executor infrastructure errors
///
/// User-visible rejections are not errors: they travel as
/// [`crate::Outcome::Rejected`] so the chat layer can render them. These
/// variants cover the plumbing only.
#[derive(Error, Debug)]
pub enum Error {
    /// Actor mailbox or response channel closed
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Snapshot load failed at startup
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Configuration file invalid
    #[error("Configuration error: {0}")]
    Config(String),
}
