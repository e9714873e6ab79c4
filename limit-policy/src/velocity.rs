//! Per-user transaction velocity guard
//!
//! Anti-spam, not a spend limit: a user hammering the bot with
//! transaction-writing messages is throttled before any ledger mutation.
//! Tracked per (group, user) over a sliding window.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use group_ledger::{GroupId, UserId};
use serde::{Deserialize, Serialize};

/// Velocity guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityConfig {
    /// Maximum transaction-writing intents per user per window
    pub max_transactions: u32,

    /// Sliding window length in seconds
    pub window_secs: i64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10,
            window_secs: 60,
        }
    }
}

/// Sliding-window rate guard over all users of all groups
pub struct VelocityGuard {
    config: VelocityConfig,
    // Map: (group, user) -> timestamps of recent writes
    windows: DashMap<(GroupId, UserId), Vec<DateTime<Utc>>>,
}

impl VelocityGuard {
    /// Create a guard with the given configuration
    pub fn new(config: VelocityConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Check and record one transaction-writing intent
    ///
    /// Rejects when the user already hit the cap inside the window; a
    /// rejected attempt is not recorded.
    pub fn check(&self, group: GroupId, user: UserId, now: DateTime<Utc>) -> Result<()> {
        let window_start = now - Duration::seconds(self.config.window_secs);

        let mut entry = self.windows.entry((group, user)).or_default();
        let timestamps = entry.value_mut();
        timestamps.retain(|t| *t >= window_start);

        if timestamps.len() >= self.config.max_transactions as usize {
            tracing::warn!(%group, %user, count = timestamps.len(), "transaction rate limit hit");
            return Err(Error::RateLimited(format!(
                "{} transactions in the last {}s (max {})",
                timestamps.len(),
                self.config.window_secs,
                self.config.max_transactions
            )));
        }

        timestamps.push(now);
        Ok(())
    }

    /// Forget a user's window (testing / manual reset)
    pub fn reset(&self, group: GroupId, user: UserId) {
        self.windows.remove(&(group, user));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_cap() {
        let guard = VelocityGuard::new(VelocityConfig {
            max_transactions: 3,
            window_secs: 60,
        });
        let group = GroupId::new(-1);
        let user = UserId::new(1);
        let now = Utc::now();

        for _ in 0..3 {
            assert!(guard.check(group, user, now).is_ok());
        }
        assert!(guard.check(group, user, now).is_err());
    }

    #[test]
    fn test_window_slides() {
        let guard = VelocityGuard::new(VelocityConfig {
            max_transactions: 2,
            window_secs: 60,
        });
        let group = GroupId::new(-1);
        let user = UserId::new(1);
        let now = Utc::now();

        assert!(guard.check(group, user, now).is_ok());
        assert!(guard.check(group, user, now).is_ok());
        assert!(guard.check(group, user, now).is_err());

        // 61 seconds later the old entries have aged out
        let later = now + Duration::seconds(61);
        assert!(guard.check(group, user, later).is_ok());
    }

    #[test]
    fn test_users_are_independent() {
        let guard = VelocityGuard::new(VelocityConfig {
            max_transactions: 1,
            window_secs: 60,
        });
        let group = GroupId::new(-1);
        let now = Utc::now();

        assert!(guard.check(group, UserId::new(1), now).is_ok());
        assert!(guard.check(group, UserId::new(2), now).is_ok());
        assert!(guard.check(group, UserId::new(1), now).is_err());
    }

    #[test]
    fn test_same_user_different_groups() {
        let guard = VelocityGuard::new(VelocityConfig {
            max_transactions: 1,
            window_secs: 60,
        });
        let user = UserId::new(1);
        let now = Utc::now();

        assert!(guard.check(GroupId::new(-1), user, now).is_ok());
        assert!(guard.check(GroupId::new(-2), user, now).is_ok());
    }
}
