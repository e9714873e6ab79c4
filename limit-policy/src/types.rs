//! Warning tiers for limit classification

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How loudly to warn about a spend percentage
///
/// Tiers, applied to a percentage of the advisory limit:
/// below 80 → `None`, 80 to just under 100 → `Warning`, 100 to just under
/// 150 → `Danger`, 150 and up → `Extreme`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    /// Under the soft threshold; say nothing special
    None,
    /// Approaching the limit
    Warning,
    /// At or over the limit
    Danger,
    /// Far over the limit
    Extreme,
}

impl WarningLevel {
    /// Classify a percentage of the limit
    pub fn from_percent(percent: Decimal) -> Self {
        if percent >= Decimal::from(150) {
            WarningLevel::Extreme
        } else if percent >= Decimal::ONE_HUNDRED {
            WarningLevel::Danger
        } else if percent >= Decimal::from(80) {
            WarningLevel::Warning
        } else {
            WarningLevel::None
        }
    }

    /// Whether this level should trigger the confirmation sub-protocol
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, WarningLevel::Danger | WarningLevel::Extreme)
    }
}
