//! Intent executor
//!
//! The state machine between the chat layer and the ledger: validates
//! untrusted classifier output, runs policy checks, applies intents to the
//! right group's ledger, and drives the pending confirmation/approval
//! protocols.
//!
//! # Concurrency
//!
//! All mutation goes through one actor task owning the ledger registry, so
//! intent processing for every group is serialized: there is no partial
//! update for a later message to observe. Snapshot persistence and
//! notification delivery happen after the mutation completes and can fail
//! without affecting ledger state.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod actor;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod executor;
pub mod intent;
pub mod metrics;
pub mod outcome;
pub mod pending;

// Re-exports
pub use actor::{spawn_executor, ExecutorHandle, ExecutorMessage};
pub use collaborators::{AuthorizationOracle, GroupConfigProvider, NotificationSink};
pub use config::Config;
pub use error::{Error, Result};
pub use executor::Executor;
pub use intent::{Intent, RawIntent, ValidatedIntent};
pub use metrics::Metrics;
pub use outcome::{Applied, Outcome, RejectReason, Rejection};
pub use pending::{ConfirmationToken, HoldId};
