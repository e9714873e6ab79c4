//! Reconciliation: rebuild aggregates from the transaction log
//!
//! The log is the source of truth. Reconciliation recomputes wallet and
//! spend aggregates from scratch, overwrites any stored value that drifted
//! past tolerance, and only then prunes the log down to its retention cap.
//! It runs on every snapshot load and may be scheduled periodically; it is
//! idempotent, so a second pass immediately after reports zero drift.

use crate::ledger::GroupLedger;
use crate::spend::{local_day, local_month_start};
use crate::types::{Category, Currency, GroupId, TxKind, Wallet};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Keep at most this many log entries after a clean reconciliation
pub const RETENTION_CAP: usize = 300;

/// A stored aggregate that disagreed with the recomputed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Value found in the ledger
    pub stored: Decimal,
    /// Value recomputed from the log
    pub recomputed: Decimal,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Group reconciled
    pub group: GroupId,

    /// Wallet balances that were corrected, per currency
    pub wallet_corrections: HashMap<Currency, Correction>,

    /// Daily spend correction, if any
    pub daily_correction: Option<Correction>,

    /// Monthly spend correction, if any
    pub monthly_correction: Option<Correction>,

    /// Number of category buckets corrected
    pub category_corrections: usize,

    /// Log entries pruned after verification
    pub pruned: usize,
}

impl ReconciliationReport {
    /// True when no stored aggregate drifted
    pub fn is_clean(&self) -> bool {
        self.wallet_corrections.is_empty()
            && self.daily_correction.is_none()
            && self.monthly_correction.is_none()
            && self.category_corrections == 0
    }
}

impl GroupLedger {
    /// Recompute all aggregates from the log, correcting drift, then prune
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> ReconciliationReport {
        self.roll_periods(now);
        let tz = self.config.timezone();

        // Wallet: carried base plus the signed fold over live transactions
        let mut wallet = Wallet::new();
        for (currency, base) in &self.carried {
            wallet.credit(*currency, *base);
        }

        let mut daily = Decimal::ZERO;
        let mut monthly = Decimal::ZERO;
        let mut categories: HashMap<Category, Decimal> = HashMap::new();

        for tx in self.transactions.iter().filter(|t| t.is_live()) {
            match tx.kind {
                TxKind::Income => wallet.credit(tx.currency, tx.amount),
                TxKind::Expense => {
                    wallet.debit(tx.currency, tx.amount);
                    if tx.currency == Currency::Usd {
                        if local_month_start(tx.at, tz) == self.monthly.month {
                            monthly += tx.amount;
                            let category = tx.category.unwrap_or(Category::Other);
                            *categories.entry(category).or_insert(Decimal::ZERO) += tx.amount;
                        }
                        if tx.counts_daily && local_day(tx.at, tz) == self.daily.day {
                            daily += tx.amount;
                        }
                    }
                }
                TxKind::Convert => {
                    wallet.debit(tx.currency, tx.amount);
                    if let (Some(target), Some(credited)) = (tx.target_currency, tx.target_amount) {
                        wallet.credit(target, credited);
                    }
                }
                TxKind::RateUpdate => {}
            }
        }

        let mut report = ReconciliationReport {
            group: self.id,
            wallet_corrections: HashMap::new(),
            daily_correction: None,
            monthly_correction: None,
            category_corrections: 0,
            pruned: 0,
        };

        for currency in [Currency::Idr, Currency::Usd] {
            let stored = self.wallet.balance(currency);
            let recomputed = wallet.balance(currency);
            if (stored - recomputed).abs() > currency.tolerance() {
                report
                    .wallet_corrections
                    .insert(currency, Correction { stored, recomputed });
                self.wallet.set_balance(currency, recomputed);
            }
        }

        let usd_tolerance = Currency::Usd.tolerance();
        if (self.daily.amount - daily).abs() > usd_tolerance {
            report.daily_correction = Some(Correction {
                stored: self.daily.amount,
                recomputed: daily,
            });
            self.daily.amount = daily;
        }
        if (self.monthly.amount - monthly).abs() > usd_tolerance {
            report.monthly_correction = Some(Correction {
                stored: self.monthly.amount,
                recomputed: monthly,
            });
            self.monthly.amount = monthly;
        }

        let mut all_categories: Vec<Category> =
            self.monthly.categories.keys().copied().collect();
        for category in categories.keys() {
            if !all_categories.contains(category) {
                all_categories.push(*category);
            }
        }
        for category in all_categories {
            let stored = self
                .monthly
                .categories
                .get(&category)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let recomputed = categories.get(&category).copied().unwrap_or(Decimal::ZERO);
            if (stored - recomputed).abs() > usd_tolerance {
                report.category_corrections += 1;
            }
        }
        if report.category_corrections > 0 {
            self.monthly.categories = categories;
        }

        if !report.is_clean() {
            tracing::warn!(
                group = %self.id,
                wallet = report.wallet_corrections.len(),
                daily = report.daily_correction.is_some(),
                monthly = report.monthly_correction.is_some(),
                categories = report.category_corrections,
                "reconciliation drift corrected"
            );
        }

        // Aggregates are now consistent with the log: safe to prune
        report.pruned = self.prune_log(now);
        report
    }

    /// Drop the oldest prunable entries once the log exceeds the cap
    ///
    /// Entries dated in the current group-local month are never pruned (the
    /// spend windows must stay recomputable). Live pruned amounts are
    /// absorbed into the carried-forward wallet base.
    fn prune_log(&mut self, now: DateTime<Utc>) -> usize {
        if self.transactions.len() <= RETENTION_CAP {
            return 0;
        }

        let tz = self.config.timezone();
        let month_start = local_month_start(now, tz);
        let mut excess = self.transactions.len() - RETENTION_CAP;
        let mut prunable = 0;
        for tx in &self.transactions {
            if excess == 0 || local_month_start(tx.at, tz) >= month_start {
                break;
            }
            prunable += 1;
            excess -= 1;
        }

        if prunable == 0 {
            return 0;
        }

        for tx in self.transactions.drain(..prunable) {
            if !tx.canceled {
                match tx.kind {
                    TxKind::Income => {
                        *self.carried.entry(tx.currency).or_insert(Decimal::ZERO) += tx.amount;
                    }
                    TxKind::Expense => {
                        *self.carried.entry(tx.currency).or_insert(Decimal::ZERO) -= tx.amount;
                    }
                    TxKind::Convert => {
                        *self.carried.entry(tx.currency).or_insert(Decimal::ZERO) -= tx.amount;
                        if let (Some(target), Some(credited)) =
                            (tx.target_currency, tx.target_amount)
                        {
                            *self.carried.entry(target).or_insert(Decimal::ZERO) += credited;
                        }
                    }
                    TxKind::RateUpdate => {}
                }
            }
        }

        tracing::info!(group = %self.id, pruned = prunable, "transaction log pruned");
        prunable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupConfig;
    use crate::types::UserRef;
    use chrono::{Duration, TimeZone};

    fn test_ledger() -> GroupLedger {
        GroupLedger::new(GroupId::new(-7), GroupConfig::default(), Utc::now())
    }

    #[test]
    fn test_clean_ledger_reports_no_drift() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(Currency::Usd, Decimal::from(30), Category::Food, true, &user, None, now)
            .unwrap();

        let report = ledger.reconcile(now);
        assert!(report.is_clean());
        assert_eq!(report.pruned, 0);
    }

    #[test]
    fn test_reconcile_corrects_corrupted_wallet() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();

        // Simulate a corrupted snapshot
        ledger.wallet.set_balance(Currency::Usd, Decimal::from(999));

        let report = ledger.reconcile(now);
        assert!(!report.is_clean());
        assert_eq!(
            report.wallet_corrections[&Currency::Usd].recomputed,
            Decimal::from(100)
        );
        assert_eq!(ledger.wallet.balance(Currency::Usd), Decimal::from(100));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(Currency::Usd, Decimal::from(40), Category::Bills, true, &user, None, now)
            .unwrap();
        ledger.daily.amount = Decimal::from(77); // drift

        let first = ledger.reconcile(now);
        assert!(!first.is_clean());

        let second = ledger.reconcile(now);
        assert!(second.is_clean());
    }

    #[test]
    fn test_reconcile_ignores_canceled_transactions() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(500_000), &user, None, None, now)
            .unwrap();
        ledger
            .apply_income(Currency::Idr, Decimal::from(100_000), &user, None, None, now)
            .unwrap();
        ledger.reverse_last(user.id, &user, now).unwrap();

        let report = ledger.reconcile(now);
        assert!(report.is_clean());
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(500_000));
    }

    #[test]
    fn test_drift_within_tolerance_is_ignored() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(100_000), &user, None, None, now)
            .unwrap();
        // Half a rupiah off: inside the 1 IDR tolerance
        ledger
            .wallet
            .set_balance(Currency::Idr, Decimal::from(100_000) + Decimal::new(5, 1));

        let report = ledger.reconcile(now);
        assert!(report.is_clean());
    }

    #[test]
    fn test_prune_absorbs_old_entries_into_carried_base() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let old = Utc.with_ymd_and_hms(2023, 1, 15, 4, 0, 0).unwrap();

        // Fill with old income well past the cap
        for _ in 0..RETENTION_CAP + 50 {
            ledger
                .apply_income(Currency::Idr, Decimal::from(1_000), &user, None, None, old)
                .unwrap();
        }
        let total = ledger.wallet.balance(Currency::Idr);

        let now = old + Duration::days(400);
        let report = ledger.reconcile(now);

        assert_eq!(report.pruned, 50);
        assert_eq!(ledger.transactions.len(), RETENTION_CAP);
        // Balance is preserved through the carried-forward base
        assert_eq!(ledger.wallet.balance(Currency::Idr), total);
        assert!(ledger.reconcile(now).is_clean());
    }

    #[test]
    fn test_current_month_entries_are_never_pruned() {
        let mut ledger = test_ledger();
        let user = UserRef::new(1, "Budi");
        let now = Utc::now();

        for _ in 0..RETENTION_CAP + 20 {
            ledger
                .apply_income(Currency::Idr, Decimal::from(1_000), &user, None, None, now)
                .unwrap();
        }

        let report = ledger.reconcile(now);
        assert_eq!(report.pruned, 0);
        assert_eq!(ledger.transactions.len(), RETENTION_CAP + 20);
    }
}
