//! On-disk snapshot document

use chrono::{DateTime, Utc};
use group_ledger::{GroupId, GroupLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot format version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// The whole persisted state: every group's ledger in one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Format version
    pub version: u32,

    /// When this snapshot was written
    pub saved_at: DateTime<Utc>,

    /// All group ledgers
    pub groups: HashMap<GroupId, GroupLedger>,
}

impl SnapshotFile {
    /// Wrap the current state for writing
    pub fn new(groups: HashMap<GroupId, GroupLedger>, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            groups,
        }
    }
}
