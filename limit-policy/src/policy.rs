//! Spend classification
//!
//! Stateless: the ledger owns the percentages, this module only decides how
//! severe they are and what to tell the group. It never rejects anything.

use crate::types::WarningLevel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Assessment of the daily and monthly percentages after an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitAssessment {
    /// Overall severity (the worse of the two windows)
    pub level: WarningLevel,

    /// Daily percentage that was classified
    pub daily_percent: Decimal,

    /// Monthly percentage that was classified
    pub monthly_percent: Decimal,

    /// Advisory text for the group, empty at `WarningLevel::None`
    pub advisory: String,
}

/// Classify post-update daily/monthly percentages
///
/// Both windows are classified independently; the more severe tier wins.
pub fn classify_spend(daily_percent: Decimal, monthly_percent: Decimal) -> LimitAssessment {
    let daily_level = WarningLevel::from_percent(daily_percent);
    let monthly_level = WarningLevel::from_percent(monthly_percent);
    let level = daily_level.max(monthly_level);

    let advisory = match level {
        WarningLevel::None => String::new(),
        _ => {
            let (window, percent) = if daily_level >= monthly_level {
                ("harian", daily_percent)
            } else {
                ("bulanan", monthly_percent)
            };
            advisory_text(level, window, percent)
        }
    };

    LimitAssessment {
        level,
        daily_percent,
        monthly_percent,
        advisory,
    }
}

fn advisory_text(level: WarningLevel, window: &str, percent: Decimal) -> String {
    let percent = percent.round_dp(1);
    match level {
        WarningLevel::None => String::new(),
        WarningLevel::Warning => format!(
            "⚠️ Pengeluaran {} sudah {}% dari limit. Hati-hati ya!",
            window, percent
        ),
        WarningLevel::Danger => format!(
            "🚨 Limit {} terlampaui! Sudah {}% dari limit. Tetap dicatat, tapi tolong dikendalikan.",
            window, percent
        ),
        WarningLevel::Extreme => format!(
            "🔥 PERINGATAN KERAS: pengeluaran {} sudah {}% dari limit!",
            window, percent
        ),
    }
}
