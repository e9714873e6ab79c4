//! Collaborator contracts
//!
//! Everything the executor needs from the outside world, abstracted from
//! chat/LLM/file specifics. Delivery is fire-and-forget; the executor never
//! learns or cares whether a message actually reached the group.

use async_trait::async_trait;
use group_ledger::{GroupConfig, GroupId, UserId};
use limit_policy::WarningLevel;

/// Outbound message delivery (the chat transport implements this)
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a message to a group at the given severity
    async fn deliver(&self, group: GroupId, message: String, level: WarningLevel);
}

/// Admin-standing lookups (the chat platform's member roles)
#[async_trait]
pub trait AuthorizationOracle: Send + Sync {
    /// Whether `user` holds admin standing in `group`
    async fn is_admin(&self, group: GroupId, user: UserId) -> bool;
}

/// Per-group configuration source (the administrative component owns writes)
#[async_trait]
pub trait GroupConfigProvider: Send + Sync {
    /// Materialized configuration for `group`, defaults filled in
    async fn config_for(&self, group: GroupId) -> GroupConfig;
}
