//! Terminal outcomes of intent processing
//!
//! Everything the chat layer needs to render a reply: applied results carry
//! the transaction and warning assessment, rejections carry a typed reason
//! plus ready-to-send text, and the two pending states carry their handles.

use crate::pending::{ConfirmationToken, HoldId};
use chrono::{DateTime, Utc};
use group_ledger::{LedgerSummary, Transaction};
use limit_policy::LimitAssessment;
use serde::{Deserialize, Serialize};

/// Typed rejection reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Malformed or missing intent fields
    InvalidIntent,
    /// Balance too low (hard gate, no override)
    InsufficientFunds,
    /// Nothing eligible to reverse
    NoTransactionToReverse,
    /// Missing or non-positive rate
    InvalidRate,
    /// Actor lacks the required standing
    NotAuthorized,
    /// Per-user transaction rate exceeded
    RateLimited,
    /// Confirmation token unknown, expired, or not the requester's
    UnknownConfirmation,
}

/// A rejected intent with user-facing text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Why
    pub reason: RejectReason,
    /// Ready-to-send message
    pub message: String,
}

impl Rejection {
    /// Build a rejection
    pub fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl From<group_ledger::Error> for Rejection {
    fn from(err: group_ledger::Error) -> Self {
        use group_ledger::Error as L;
        let reason = match &err {
            L::InvalidAmount(_) => RejectReason::InvalidIntent,
            L::InsufficientFunds { .. } => RejectReason::InsufficientFunds,
            L::NoTransactionToReverse(_) => RejectReason::NoTransactionToReverse,
            L::InvalidRate(_) => RejectReason::InvalidRate,
        };
        let message = match &err {
            L::InsufficientFunds {
                currency,
                required,
                available,
            } => format!(
                "❌ Saldo {} tidak cukup: butuh {}, tersedia {}.",
                currency, required, available
            ),
            L::NoTransactionToReverse(_) => {
                "❌ Tidak ada transaksi yang bisa dibatalkan.".to_string()
            }
            L::InvalidRate(rate) => format!("❌ Kurs tidak valid: {}.", rate),
            other => format!("❌ Transaksi ditolak: {}.", other),
        };
        Self { reason, message }
    }
}

/// A successfully applied intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applied {
    /// The recorded transaction
    pub tx: Transaction,

    /// Limit assessment (expenses only)
    pub assessment: Option<LimitAssessment>,

    /// Daily threshold markers crossed by this expense
    pub crossed_markers: Vec<u32>,

    /// Ready-to-send confirmation text
    pub message: String,
}

/// Terminal result of processing one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Outcome {
    /// Ledger mutated, transaction recorded, persistence requested
    Applied(Applied),

    /// Nothing happened; the message says why
    Rejected(Rejection),

    /// Held for an explicit confirmation from the same user
    PendingConfirmation {
        /// Single-use token to confirm or decline with
        token: ConfirmationToken,
        /// Deadline after which the token is swept
        expires_at: DateTime<Utc>,
        /// Ready-to-send prompt
        message: String,
    },

    /// Held for admin approval
    PendingApproval {
        /// Handle an admin approves or rejects with
        hold_id: HoldId,
        /// Ready-to-send notice
        message: String,
    },

    /// A pending item was discarded (decline, hold rejection, expiry)
    Discarded {
        /// Ready-to-send notice
        message: String,
    },

    /// Read-only summary for a query intent
    Report(LedgerSummary),
}
