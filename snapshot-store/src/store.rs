//! Persistence collaborator
//!
//! `SnapshotBackend` is the abstract contract the executor talks to; the
//! file store is the production implementation. Writes are whole-document
//! rewrites through a temp file + rename, serialized behind a mutex so two
//! back-to-back saves never interleave (last write wins).

use crate::error::{Error, Result};
use crate::snapshot::{SnapshotFile, SNAPSHOT_VERSION};
use async_trait::async_trait;
use chrono::Utc;
use group_ledger::{GroupId, GroupLedger};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Abstract persistence collaborator for the executor
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read the persisted state for all known groups
    ///
    /// Every restored ledger has been reconciled and period-rolled before
    /// it is exposed.
    async fn load(&self) -> Result<HashMap<GroupId, GroupLedger>>;

    /// Write the full current state
    async fn save(&self, groups: &HashMap<GroupId, GroupLedger>) -> Result<()>;
}

/// JSON file-backed snapshot store
pub struct FileSnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    /// Store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot file location
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SnapshotBackend for FileSnapshotStore {
    async fn load(&self) -> Result<HashMap<GroupId, GroupLedger>> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no snapshot file, starting empty");
            return Ok(HashMap::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let snapshot: SnapshotFile = serde_json::from_str(&content)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut groups = snapshot.groups;
        let now = Utc::now();
        for (id, ledger) in groups.iter_mut() {
            // Rolls lapsed day/month windows and corrects any drift before
            // the rest of the system sees the ledger
            let report = ledger.reconcile(now);
            if !report.is_clean() {
                tracing::warn!(group = %id, ?report, "snapshot drift corrected on load");
            }
        }

        tracing::info!(
            path = %self.path.display(),
            groups = groups.len(),
            saved_at = %snapshot.saved_at,
            "snapshot loaded"
        );
        Ok(groups)
    }

    async fn save(&self, groups: &HashMap<GroupId, GroupLedger>) -> Result<()> {
        // Serialize outside the lock; only the file write is exclusive
        let snapshot = SnapshotFile::new(groups.clone(), Utc::now());
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            groups = groups.len(),
            bytes = json.len(),
            "snapshot saved"
        );
        Ok(())
    }
}
