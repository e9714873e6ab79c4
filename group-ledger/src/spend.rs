//! Daily and monthly spend windows
//!
//! Both windows track USD expense totals against an advisory limit and are
//! keyed to the group-local calendar (day and month respectively). They are
//! derived state: reconciliation can always rebuild them from the
//! transaction log.

use crate::types::Category;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Percent thresholds that trigger a one-time notification when crossed
pub const THRESHOLD_MARKERS: [u32; 3] = [80, 100, 150];

/// The group-local calendar day containing `at`
pub fn local_day(at: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// First day of the group-local calendar month containing `at`
pub fn local_month_start(at: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    let day = local_day(at, tz);
    day.with_day(1).unwrap_or(day)
}

/// `spent / limit` as a percentage; zero when no limit is configured
pub fn percent_of(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        spent / limit * Decimal::ONE_HUNDRED
    }
}

/// USD spent today that counts toward the daily limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    /// Total counted toward the limit
    pub amount: Decimal,

    /// The advisory limit in effect
    pub limit: Decimal,

    /// Group-local day this window covers
    pub day: NaiveDate,

    /// Threshold markers already notified (de-duplicates warnings)
    pub crossed: BTreeSet<u32>,
}

impl DailySpend {
    /// Fresh window for `day`
    pub fn new(limit: Decimal, day: NaiveDate) -> Self {
        Self {
            amount: Decimal::ZERO,
            limit,
            day,
            crossed: BTreeSet::new(),
        }
    }

    /// Reset when the group-local day has moved on
    pub fn roll(&mut self, today: NaiveDate) {
        if self.day != today {
            self.amount = Decimal::ZERO;
            self.crossed.clear();
            self.day = today;
        }
    }

    /// Percentage of the limit spent
    pub fn percent(&self) -> Decimal {
        percent_of(self.amount, self.limit)
    }

    /// Accrue an expense; returns markers newly crossed by this accrual
    pub fn accrue(&mut self, amount: Decimal) -> Vec<u32> {
        let before = self.percent();
        self.amount += amount;
        let after = self.percent();

        let mut newly_crossed = Vec::new();
        for marker in THRESHOLD_MARKERS {
            let m = Decimal::from(marker);
            if before < m && after >= m && self.crossed.insert(marker) {
                newly_crossed.push(marker);
            }
        }
        newly_crossed
    }

    /// Remove a reversed expense, clamped at zero
    pub fn rollback(&mut self, amount: Decimal) {
        self.amount = (self.amount - amount).max(Decimal::ZERO);
    }
}

/// All USD spent this month, with per-category totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpend {
    /// Total USD expenses this month (daily-limit flag is irrelevant here)
    pub amount: Decimal,

    /// The advisory limit in effect
    pub limit: Decimal,

    /// First day of the group-local month this window covers
    pub month: NaiveDate,

    /// Accumulated USD per category
    pub categories: HashMap<Category, Decimal>,
}

impl MonthlySpend {
    /// Fresh window for the month starting at `month`
    pub fn new(limit: Decimal, month: NaiveDate) -> Self {
        Self {
            amount: Decimal::ZERO,
            limit,
            month,
            categories: HashMap::new(),
        }
    }

    /// Reset when the group-local month has moved on
    pub fn roll(&mut self, month_start: NaiveDate) {
        if self.month != month_start {
            self.amount = Decimal::ZERO;
            self.categories.clear();
            self.month = month_start;
        }
    }

    /// Percentage of the limit spent
    pub fn percent(&self) -> Decimal {
        percent_of(self.amount, self.limit)
    }

    /// Accrue an expense into the total and its category bucket
    pub fn accrue(&mut self, amount: Decimal, category: Category) {
        self.amount += amount;
        *self.categories.entry(category).or_insert(Decimal::ZERO) += amount;
    }

    /// Remove a reversed expense, clamped at zero
    pub fn rollback(&mut self, amount: Decimal, category: Category) {
        self.amount = (self.amount - amount).max(Decimal::ZERO);
        if let Some(total) = self.categories.get_mut(&category) {
            *total = (*total - amount).max(Decimal::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn test_local_day_crosses_utc_midnight() {
        // 20:00 UTC is already 03:00 the next day in WIB
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        assert_eq!(
            local_day(at, wib()),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_percent_of_zero_limit() {
        assert_eq!(percent_of(Decimal::from(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_daily_accrue_reports_crossed_markers_once() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let mut daily = DailySpend::new(Decimal::from(100), day);

        assert!(daily.accrue(Decimal::from(50)).is_empty());
        assert_eq!(daily.accrue(Decimal::from(35)), vec![80]);
        // Already past 80: only the 100 marker fires now
        assert_eq!(daily.accrue(Decimal::from(20)), vec![100]);
        assert!(daily.accrue(Decimal::from(1)).is_empty());
    }

    #[test]
    fn test_daily_roll_resets_amount_and_markers() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let mut daily = DailySpend::new(Decimal::from(100), day);
        daily.accrue(Decimal::from(90));
        assert_eq!(daily.crossed.len(), 1);

        daily.roll(day.succ_opt().unwrap());
        assert_eq!(daily.amount, Decimal::ZERO);
        assert!(daily.crossed.is_empty());
    }

    #[test]
    fn test_monthly_rollback_clamps_at_zero() {
        let month = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut monthly = MonthlySpend::new(Decimal::from(1_000), month);
        monthly.accrue(Decimal::from(10), Category::Food);
        monthly.rollback(Decimal::from(25), Category::Food);
        assert_eq!(monthly.amount, Decimal::ZERO);
        assert_eq!(monthly.categories[&Category::Food], Decimal::ZERO);
    }
}
