//! Group configuration
//!
//! Limits and policy knobs are materialized once, with defaults, when a
//! group is provisioned or loaded; call sites never re-derive defaults.

use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-group configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Daily USD spending limit (advisory: breaches warn, never block)
    pub daily_limit_usd: Decimal,

    /// Monthly USD spending limit (advisory)
    pub monthly_limit_usd: Decimal,

    /// Group-local timezone as minutes east of UTC
    pub utc_offset_minutes: i32,

    /// Amount above which a transaction needs admin approval
    pub big_transaction_threshold: Decimal,

    /// Whether the big-transaction approval flow is enabled
    pub require_admin_for_big_transactions: bool,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            daily_limit_usd: Decimal::from(50),
            monthly_limit_usd: Decimal::from(1_000),
            utc_offset_minutes: 420, // WIB (UTC+7)
            big_transaction_threshold: Decimal::from(5_000_000),
            require_admin_for_big_transactions: false,
        }
    }
}

impl GroupConfig {
    /// The group's local timezone
    ///
    /// Out-of-range offsets fall back to UTC rather than failing a ledger
    /// operation over a config typo.
    pub fn timezone(&self) -> FixedOffset {
        let secs = self.utc_offset_minutes.clamp(-1439, 1439) * 60;
        FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
    }
}
