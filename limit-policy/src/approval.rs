//! Big-transaction approval policy
//!
//! Independent of the currency/limit logic: a transaction over the
//! configured threshold from a non-admin is held for explicit admin
//! approval instead of being applied.

use group_ledger::GroupConfig;
use rust_decimal::Decimal;

/// Whether a transaction may proceed or must wait for an admin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Apply immediately
    Proceed,
    /// Hold until an admin approves
    Hold,
}

/// Decide whether `amount` needs an admin approval hold
pub fn evaluate_big_transaction(
    config: &GroupConfig,
    amount: Decimal,
    is_admin: bool,
) -> ApprovalDecision {
    if config.require_admin_for_big_transactions
        && amount > config.big_transaction_threshold
        && !is_admin
    {
        ApprovalDecision::Hold
    } else {
        ApprovalDecision::Proceed
    }
}
