//! Pending confirmations and approval holds
//!
//! Both tables are strictly per-group: a token registered in group A does
//! not exist from group B's point of view. Nothing blocks waiting on a
//! pending item; registration returns immediately and a later independent
//! message redeems it. Expiry is a timer-driven sweep.

use crate::intent::RawIntent;
use chrono::{DateTime, Duration, Utc};
use group_ledger::{GroupId, UserId, UserRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Single-use handle for a pending confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationToken(Uuid);

impl ConfirmationToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the callback payload
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a big-transaction approval hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldId(Uuid);

impl HoldId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the callback payload
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An intent waiting for its author to confirm
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    /// Token the author confirms or declines with
    pub token: ConfirmationToken,
    /// Who must confirm
    pub user: UserRef,
    /// The original raw intent (re-validated on redemption)
    pub raw: RawIntent,
    /// When it was registered
    pub created_at: DateTime<Utc>,
    /// When it stops being redeemable
    pub expires_at: DateTime<Utc>,
}

/// An intent waiting for an admin
#[derive(Debug, Clone)]
pub struct PendingApproval {
    /// Handle for approve/reject
    pub id: HoldId,
    /// Who asked for the transaction
    pub requester: UserRef,
    /// The original raw intent (re-validated at approval time)
    pub raw: RawIntent,
    /// When it was registered
    pub created_at: DateTime<Utc>,
}

/// Why a redemption failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemError {
    /// No such token in this group
    NotFound,
    /// Token existed but its deadline passed
    Expired,
    /// Token belongs to a different user
    WrongUser,
}

#[derive(Debug, Default)]
struct GroupPending {
    confirmations: HashMap<ConfirmationToken, PendingConfirmation>,
    approvals: HashMap<HoldId, PendingApproval>,
}

/// Per-group pending state, owned by the executor
#[derive(Debug, Default)]
pub struct PendingTables {
    groups: HashMap<GroupId, GroupPending>,
}

impl PendingTables {
    /// Empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a confirmation; returns the token and its deadline
    pub fn register_confirmation(
        &mut self,
        group: GroupId,
        user: UserRef,
        raw: RawIntent,
        now: DateTime<Utc>,
        ttl_secs: i64,
    ) -> (ConfirmationToken, DateTime<Utc>) {
        let token = ConfirmationToken::generate();
        let expires_at = now + Duration::seconds(ttl_secs);
        self.groups.entry(group).or_default().confirmations.insert(
            token,
            PendingConfirmation {
                token,
                user,
                raw,
                created_at: now,
                expires_at,
            },
        );
        (token, expires_at)
    }

    /// Redeem a confirmation token: single use, same user, before deadline
    pub fn redeem_confirmation(
        &mut self,
        group: GroupId,
        token: ConfirmationToken,
        user: UserId,
        now: DateTime<Utc>,
    ) -> std::result::Result<PendingConfirmation, RedeemError> {
        let pending = self.groups.get_mut(&group).ok_or(RedeemError::NotFound)?;

        let entry = pending
            .confirmations
            .get(&token)
            .ok_or(RedeemError::NotFound)?;
        if entry.user.id != user {
            return Err(RedeemError::WrongUser);
        }
        if now > entry.expires_at {
            pending.confirmations.remove(&token);
            return Err(RedeemError::Expired);
        }

        // Single use: redemption consumes the token
        pending
            .confirmations
            .remove(&token)
            .ok_or(RedeemError::NotFound)
    }

    /// Explicitly discard a confirmation (only its author may decline)
    pub fn decline_confirmation(
        &mut self,
        group: GroupId,
        token: ConfirmationToken,
        user: UserId,
    ) -> Option<PendingConfirmation> {
        let pending = self.groups.get_mut(&group)?;
        if pending.confirmations.get(&token)?.user.id != user {
            return None;
        }
        pending.confirmations.remove(&token)
    }

    /// Register an approval hold
    pub fn register_approval(
        &mut self,
        group: GroupId,
        requester: UserRef,
        raw: RawIntent,
        now: DateTime<Utc>,
    ) -> HoldId {
        let id = HoldId::generate();
        self.groups.entry(group).or_default().approvals.insert(
            id,
            PendingApproval {
                id,
                requester,
                raw,
                created_at: now,
            },
        );
        id
    }

    /// Take an approval hold out of the table (approve or reject)
    pub fn take_approval(&mut self, group: GroupId, id: HoldId) -> Option<PendingApproval> {
        self.groups.get_mut(&group)?.approvals.remove(&id)
    }

    /// Remove and return every confirmation past its deadline
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<(GroupId, PendingConfirmation)> {
        let mut expired = Vec::new();
        for (group, pending) in self.groups.iter_mut() {
            let dead: Vec<ConfirmationToken> = pending
                .confirmations
                .values()
                .filter(|c| now > c.expires_at)
                .map(|c| c.token)
                .collect();
            for token in dead {
                if let Some(confirmation) = pending.confirmations.remove(&token) {
                    expired.push((*group, confirmation));
                }
            }
        }
        expired
    }

    /// Total live confirmations (metrics)
    pub fn confirmation_count(&self) -> usize {
        self.groups.values().map(|g| g.confirmations.len()).sum()
    }

    /// Total live approval holds (metrics)
    pub fn approval_count(&self) -> usize {
        self.groups.values().map(|g| g.approvals.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_expense() -> RawIntent {
        RawIntent {
            kind: Some("expense".to_string()),
            amount: Some(10.0),
            currency: Some("USD".to_string()),
            ..RawIntent::default()
        }
    }

    #[test]
    fn test_token_is_single_use() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        let (token, _) =
            tables.register_confirmation(group, user.clone(), raw_expense(), now, 60);

        assert!(tables
            .redeem_confirmation(group, token, user.id, now)
            .is_ok());
        assert_eq!(
            tables.redeem_confirmation(group, token, user.id, now),
            Err(RedeemError::NotFound)
        );
    }

    #[test]
    fn test_token_bound_to_user() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let now = Utc::now();

        let (token, _) = tables.register_confirmation(
            group,
            UserRef::new(1, "Budi"),
            raw_expense(),
            now,
            60,
        );

        assert_eq!(
            tables.redeem_confirmation(group, token, UserId::new(2), now),
            Err(RedeemError::WrongUser)
        );
        // Still redeemable by the right user afterwards
        assert!(tables
            .redeem_confirmation(group, token, UserId::new(1), now)
            .is_ok());
    }

    #[test]
    fn test_token_invisible_across_groups() {
        let mut tables = PendingTables::new();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        let (token, _) = tables.register_confirmation(
            GroupId::new(-1),
            user.clone(),
            raw_expense(),
            now,
            60,
        );

        assert_eq!(
            tables.redeem_confirmation(GroupId::new(-2), token, user.id, now),
            Err(RedeemError::NotFound)
        );
    }

    #[test]
    fn test_expired_token_rejected_and_removed() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        let (token, expires_at) =
            tables.register_confirmation(group, user.clone(), raw_expense(), now, 60);

        let late = expires_at + Duration::seconds(1);
        assert_eq!(
            tables.redeem_confirmation(group, token, user.id, late),
            Err(RedeemError::Expired)
        );
        assert_eq!(tables.confirmation_count(), 0);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        tables.register_confirmation(group, user.clone(), raw_expense(), now, 10);
        tables.register_confirmation(group, user.clone(), raw_expense(), now, 120);

        let expired = tables.sweep_expired(now + Duration::seconds(30));
        assert_eq!(expired.len(), 1);
        assert_eq!(tables.confirmation_count(), 1);
    }

    #[test]
    fn test_decline_requires_author() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        let (token, _) =
            tables.register_confirmation(group, user.clone(), raw_expense(), now, 60);

        assert!(tables
            .decline_confirmation(group, token, UserId::new(2))
            .is_none());
        assert!(tables
            .decline_confirmation(group, token, user.id)
            .is_some());
        assert_eq!(tables.confirmation_count(), 0);
    }

    #[test]
    fn test_approval_take_is_single_shot() {
        let mut tables = PendingTables::new();
        let group = GroupId::new(-1);
        let now = Utc::now();

        let id = tables.register_approval(group, UserRef::new(1, "Budi"), raw_expense(), now);
        assert_eq!(tables.approval_count(), 1);

        assert!(tables.take_approval(group, id).is_some());
        assert!(tables.take_approval(group, id).is_none());
    }
}
