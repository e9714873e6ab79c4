//! Snapshot persistence for group ledgers
//!
//! The whole multi-group state is serialized to a single versioned JSON
//! document. Persistence is best-effort durability, not a transactional
//! guarantee: in-memory state is the source of truth between snapshots, and
//! a failed save never affects ledger correctness.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
pub use snapshot::{SnapshotFile, SNAPSHOT_VERSION};
pub use store::{FileSnapshotStore, SnapshotBackend};
