//! Registry of all known group ledgers
//!
//! An explicit repository object with an init-on-load / mutate-during-run /
//! flush-on-save lifecycle. The intent executor owns the single instance
//! and passes it around; nothing reads ambient shared state.

use crate::config::GroupConfig;
use crate::ledger::GroupLedger;
use crate::types::{Currency, GroupId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All group ledgers, keyed by group
#[derive(Debug, Default)]
pub struct LedgerRegistry {
    groups: HashMap<GroupId, GroupLedger>,
}

/// System-wide totals for the admin panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of provisioned groups
    pub groups: usize,

    /// Non-canceled transactions across all groups
    pub transactions: usize,

    /// Gross non-canceled volume per currency
    pub volume: HashMap<Currency, Decimal>,
}

impl LedgerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry over ledgers restored from a snapshot
    pub fn from_groups(groups: HashMap<GroupId, GroupLedger>) -> Self {
        Self { groups }
    }

    /// Look up a group
    pub fn get(&self, id: GroupId) -> Option<&GroupLedger> {
        self.groups.get(&id)
    }

    /// Look up a group for mutation
    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut GroupLedger> {
        self.groups.get_mut(&id)
    }

    /// Fetch a group's ledger, provisioning it on first interaction
    pub fn get_or_create(
        &mut self,
        id: GroupId,
        config: GroupConfig,
        now: DateTime<Utc>,
    ) -> &mut GroupLedger {
        self.groups
            .entry(id)
            .or_insert_with(|| GroupLedger::new(id, config, now))
    }

    /// Administrative deletion
    pub fn remove(&mut self, id: GroupId) -> Option<GroupLedger> {
        self.groups.remove(&id)
    }

    /// All ledgers, for snapshotting
    pub fn groups(&self) -> &HashMap<GroupId, GroupLedger> {
        &self.groups
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when no groups are provisioned
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// System-wide totals
    pub fn stats(&self) -> RegistryStats {
        let mut transactions = 0;
        let mut volume: HashMap<Currency, Decimal> = HashMap::new();

        for ledger in self.groups.values() {
            for tx in ledger.transactions.iter().filter(|t| t.is_live()) {
                transactions += 1;
                *volume.entry(tx.currency).or_insert(Decimal::ZERO) += tx.amount;
            }
        }

        RegistryStats {
            groups: self.groups.len(),
            transactions,
            volume,
        }
    }
}
