//! Error types for the policy engine

use thiserror::Error;

/// Result type for policy checks
pub type Result<T> = std::result::Result<T, Error>;

/// Policy errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// User wrote transactions faster than the per-user rate allows
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
}
