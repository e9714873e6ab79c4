//! Per-group ledger state and its mutating operations
//!
//! A [`GroupLedger`] owns everything financial for one chat group. All
//! mutations run synchronously: callers (the intent executor) serialize
//! access, and each operation finishes its balance check, balance mutation,
//! and log append without an intervening await point.
//!
//! Authorization is the caller's job: `reverse_last` trusts that the caller
//! has already checked the actor may reverse on behalf of `target`.

use crate::config::GroupConfig;
use crate::error::{Error, Result};
use crate::spend::{local_day, local_month_start, percent_of, DailySpend, MonthlySpend};
use crate::types::{
    Category, Currency, GroupId, Transaction, TxId, TxKind, UserId, UserRef, UserStats, Wallet,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fallback IDR-per-USD rate for a freshly provisioned group
pub const DEFAULT_IDR_PER_USD: i64 = 16_000;

/// Full financial state for one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupLedger {
    /// Owning group
    pub id: GroupId,

    /// Materialized configuration (limits, timezone, approval policy)
    pub config: GroupConfig,

    /// Balances per currency
    pub wallet: Wallet,

    /// Append-only transaction log, oldest first
    pub transactions: Vec<Transaction>,

    /// Today's limit-counted USD spend
    pub daily: DailySpend,

    /// This month's USD spend and category totals
    pub monthly: MonthlySpend,

    /// IDR per USD
    pub exchange_rate: Decimal,

    /// Per-user accumulated statistics
    pub users: HashMap<UserId, UserStats>,

    /// Wallet base carried forward from pruned log entries
    #[serde(default)]
    pub carried: HashMap<Currency, Decimal>,
}

/// Result of a successfully applied expense
#[derive(Debug, Clone)]
pub struct ExpenseApplied {
    /// The recorded transaction
    pub tx: Transaction,

    /// Daily percentage after the update
    pub daily_percent: Decimal,

    /// Monthly percentage after the update
    pub monthly_percent: Decimal,

    /// Daily threshold markers crossed by this expense (for notifications)
    pub crossed_daily: Vec<u32>,
}

/// Read-only snapshot answered to a query intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Balances per currency
    pub balances: HashMap<Currency, Decimal>,

    /// IDR per USD
    pub exchange_rate: Decimal,

    /// Daily spend, limit, and percentage
    pub daily_spent: Decimal,
    /// Daily limit in effect
    pub daily_limit: Decimal,
    /// Daily percentage
    pub daily_percent: Decimal,

    /// Monthly spend, limit, and percentage
    pub monthly_spent: Decimal,
    /// Monthly limit in effect
    pub monthly_limit: Decimal,
    /// Monthly percentage
    pub monthly_percent: Decimal,

    /// USD per category this month
    pub categories: HashMap<Category, Decimal>,

    /// Non-canceled transactions currently in the log
    pub live_transactions: usize,
}

impl GroupLedger {
    /// Fresh ledger for a newly provisioned group
    pub fn new(id: GroupId, config: GroupConfig, now: DateTime<Utc>) -> Self {
        let tz = config.timezone();
        let daily = DailySpend::new(config.daily_limit_usd, local_day(now, tz));
        let monthly = MonthlySpend::new(config.monthly_limit_usd, local_month_start(now, tz));

        Self {
            id,
            config,
            wallet: Wallet::new(),
            transactions: Vec::new(),
            daily,
            monthly,
            exchange_rate: Decimal::from(DEFAULT_IDR_PER_USD),
            users: HashMap::new(),
            carried: HashMap::new(),
        }
    }

    /// Sync limits from config and reset spend windows that have lapsed
    ///
    /// Runs before every accrual and on snapshot load, so a ledger that
    /// slept across a day or month boundary wakes up with clean windows.
    pub fn roll_periods(&mut self, now: DateTime<Utc>) {
        let tz = self.config.timezone();
        self.daily.limit = self.config.daily_limit_usd;
        self.monthly.limit = self.config.monthly_limit_usd;
        self.daily.roll(local_day(now, tz));
        self.monthly.roll(local_month_start(now, tz));
    }

    /// Record money in
    ///
    /// No limit accounting applies to income.
    pub fn apply_income(
        &mut self,
        currency: Currency,
        amount: Decimal,
        user: &UserRef,
        description: Option<String>,
        category: Option<Category>,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        validate_amount(amount)?;
        self.roll_periods(now);

        self.wallet.credit(currency, amount);
        let tx = self.append(Transaction {
            id: TxId::generate(),
            at: now,
            user: user.clone(),
            kind: TxKind::Income,
            amount,
            currency,
            target_currency: None,
            target_amount: None,
            category,
            description,
            counts_daily: false,
            canceled: false,
            canceled_by: None,
            canceled_at: None,
        });

        let stats = self.user_stats_mut(user.id, now);
        stats.record_transaction(now);
        stats.add_net(currency, amount);

        tracing::info!(group = %self.id, user = %user.id, %currency, %amount, "income recorded");
        Ok(tx)
    }

    /// Record money out
    ///
    /// The balance check is a hard gate and runs first. Limit accounting is
    /// unconditional for USD expenses: totals accrue even past 100%, the
    /// policy layer only decides how loudly to warn.
    pub fn apply_expense(
        &mut self,
        currency: Currency,
        amount: Decimal,
        category: Category,
        counts_daily: bool,
        user: &UserRef,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ExpenseApplied> {
        validate_amount(amount)?;
        self.roll_periods(now);

        let available = self.wallet.balance(currency);
        if amount > available {
            return Err(Error::InsufficientFunds {
                currency,
                required: amount,
                available,
            });
        }

        let mut crossed_daily = Vec::new();
        if currency == Currency::Usd {
            self.monthly.accrue(amount, category);
            if counts_daily {
                crossed_daily = self.daily.accrue(amount);
            }
        }

        self.wallet.debit(currency, amount);
        let tx = self.append(Transaction {
            id: TxId::generate(),
            at: now,
            user: user.clone(),
            kind: TxKind::Expense,
            amount,
            currency,
            target_currency: None,
            target_amount: None,
            category: Some(category),
            description,
            counts_daily,
            canceled: false,
            canceled_by: None,
            canceled_at: None,
        });

        let stats = self.user_stats_mut(user.id, now);
        stats.record_transaction(now);
        stats.add_net(currency, -amount);

        tracing::info!(
            group = %self.id,
            user = %user.id,
            %currency,
            %amount,
            %category,
            counts_daily,
            "expense recorded"
        );

        Ok(ExpenseApplied {
            tx,
            daily_percent: self.daily.percent(),
            monthly_percent: self.monthly.percent(),
            crossed_daily,
        })
    }

    /// Convert between the two wallet currencies
    ///
    /// `rate` means target units per source unit. A supplied positive rate
    /// also refreshes the stored IDR-per-USD rate (inverted for IDR→USD).
    /// With neither rate nor target amount given, the stored rate is used.
    /// Conversions never touch the spend aggregates.
    pub fn apply_conversion(
        &mut self,
        source: Currency,
        amount: Decimal,
        target: Currency,
        rate: Option<Decimal>,
        target_amount: Option<Decimal>,
        user: &UserRef,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        validate_amount(amount)?;
        self.roll_periods(now);

        let available = self.wallet.balance(source);
        if amount > available {
            return Err(Error::InsufficientFunds {
                currency: source,
                required: amount,
                available,
            });
        }

        if let Some(r) = rate {
            if r <= Decimal::ZERO {
                return Err(Error::InvalidRate(r.to_string()));
            }
            match (source, target) {
                (Currency::Usd, Currency::Idr) => self.exchange_rate = r,
                (Currency::Idr, Currency::Usd) => self.exchange_rate = Decimal::ONE / r,
                _ => {}
            }
        }

        let credited = match (target_amount, rate) {
            (Some(t), _) => {
                validate_amount(t)?;
                t
            }
            (None, Some(r)) => amount * r,
            (None, None) => match (source, target) {
                (Currency::Usd, Currency::Idr) => amount * self.exchange_rate,
                (Currency::Idr, Currency::Usd) => {
                    if self.exchange_rate <= Decimal::ZERO {
                        return Err(Error::InvalidRate(self.exchange_rate.to_string()));
                    }
                    amount / self.exchange_rate
                }
                _ => amount,
            },
        };

        self.wallet.debit(source, amount);
        self.wallet.credit(target, credited);

        let tx = self.append(Transaction {
            id: TxId::generate(),
            at: now,
            user: user.clone(),
            kind: TxKind::Convert,
            amount,
            currency: source,
            target_currency: Some(target),
            target_amount: Some(credited),
            category: None,
            description,
            counts_daily: false,
            canceled: false,
            canceled_by: None,
            canceled_at: None,
        });

        let stats = self.user_stats_mut(user.id, now);
        stats.record_transaction(now);
        stats.add_net(source, -amount);
        stats.add_net(target, credited);

        tracing::info!(
            group = %self.id,
            user = %user.id,
            %source,
            %target,
            %amount,
            %credited,
            "conversion recorded"
        );
        Ok(tx)
    }

    /// Set the IDR-per-USD rate explicitly
    pub fn apply_rate_update(
        &mut self,
        rate: Decimal,
        user: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        if rate <= Decimal::ZERO {
            return Err(Error::InvalidRate(rate.to_string()));
        }
        self.roll_periods(now);
        self.exchange_rate = rate;

        let tx = self.append(Transaction {
            id: TxId::generate(),
            at: now,
            user: user.clone(),
            kind: TxKind::RateUpdate,
            amount: rate,
            currency: Currency::Idr,
            target_currency: None,
            target_amount: None,
            category: None,
            description: None,
            counts_daily: false,
            canceled: false,
            canceled_by: None,
            canceled_at: None,
        });

        self.user_stats_mut(user.id, now).record_transaction(now);

        tracing::info!(group = %self.id, user = %user.id, %rate, "exchange rate updated");
        Ok(tx)
    }

    /// Reverse `target`'s most recent non-canceled transaction
    ///
    /// Applies the exact inverse of the original operation and flags the
    /// record canceled with `actor` and `now`. Rate updates are not
    /// reversible and are skipped when searching. Spend-window decrements
    /// only apply when the reversed transaction falls inside the current
    /// window; reconciliation enforces the same rule.
    pub fn reverse_last(
        &mut self,
        target: UserId,
        actor: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        self.roll_periods(now);
        let tz = self.config.timezone();

        let idx = self
            .transactions
            .iter()
            .rposition(|t| t.is_live() && t.user.id == target && t.kind != TxKind::RateUpdate)
            .ok_or(Error::NoTransactionToReverse(target))?;

        // Work out the inverse before mutating anything
        let (kind, amount, currency, target_currency, target_amount, category, counts_daily, at) = {
            let tx = &self.transactions[idx];
            (
                tx.kind,
                tx.amount,
                tx.currency,
                tx.target_currency,
                tx.target_amount,
                tx.category,
                tx.counts_daily,
                tx.at,
            )
        };

        match kind {
            TxKind::Income => {
                self.wallet.debit(currency, amount);
                self.user_stats_mut(target, now).add_net(currency, -amount);
            }
            TxKind::Expense => {
                self.wallet.credit(currency, amount);
                self.user_stats_mut(target, now).add_net(currency, amount);

                if currency == Currency::Usd {
                    if local_month_start(at, tz) == self.monthly.month {
                        let category = category.unwrap_or(Category::Other);
                        self.monthly.rollback(amount, category);
                    }
                    if counts_daily && local_day(at, tz) == self.daily.day {
                        self.daily.rollback(amount);
                    }
                }
            }
            TxKind::Convert => {
                let tgt = target_currency.unwrap_or(currency);
                let credited = target_amount.unwrap_or(Decimal::ZERO);
                self.wallet.credit(currency, amount);
                self.wallet.debit(tgt, credited);
                let stats = self.user_stats_mut(target, now);
                stats.add_net(currency, amount);
                stats.add_net(tgt, -credited);
            }
            TxKind::RateUpdate => unreachable!("filtered out above"),
        }

        let tx = &mut self.transactions[idx];
        tx.canceled = true;
        tx.canceled_by = Some(actor.clone());
        tx.canceled_at = Some(now);
        let reversed = tx.clone();

        tracing::info!(
            group = %self.id,
            target = %target,
            actor = %actor.id,
            tx = %reversed.id,
            "transaction reversed"
        );
        Ok(reversed)
    }

    /// Current daily/monthly percentages
    pub fn percentages(&self) -> (Decimal, Decimal) {
        (self.daily.percent(), self.monthly.percent())
    }

    /// Percentages the windows would show if this expense were applied
    ///
    /// The confirmation protocol classifies an expense before deciding
    /// whether to apply it, so this must not mutate anything beyond rolling
    /// lapsed windows.
    pub fn prospective_percentages(
        &mut self,
        currency: Currency,
        amount: Decimal,
        counts_daily: bool,
        now: DateTime<Utc>,
    ) -> (Decimal, Decimal) {
        self.roll_periods(now);
        if currency != Currency::Usd {
            return (self.daily.percent(), self.monthly.percent());
        }

        let daily = if counts_daily {
            percent_of(self.daily.amount + amount, self.daily.limit)
        } else {
            self.daily.percent()
        };
        let monthly = percent_of(self.monthly.amount + amount, self.monthly.limit);
        (daily, monthly)
    }

    /// Read-only summary for query intents
    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            balances: self.wallet.balances().clone(),
            exchange_rate: self.exchange_rate,
            daily_spent: self.daily.amount,
            daily_limit: self.daily.limit,
            daily_percent: self.daily.percent(),
            monthly_spent: self.monthly.amount,
            monthly_limit: self.monthly.limit,
            monthly_percent: self.monthly.percent(),
            categories: self.monthly.categories.clone(),
            live_transactions: self.transactions.iter().filter(|t| t.is_live()).count(),
        }
    }

    fn append(&mut self, tx: Transaction) -> Transaction {
        self.transactions.push(tx.clone());
        tx
    }

    fn user_stats_mut(&mut self, user: UserId, now: DateTime<Utc>) -> &mut UserStats {
        self.users.entry(user).or_insert_with(|| UserStats::new(now))
    }
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount(amount.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_user() -> UserRef {
        UserRef::new(101, "Budi")
    }

    fn test_ledger() -> GroupLedger {
        GroupLedger::new(GroupId::new(-100200), GroupConfig::default(), Utc::now())
    }

    #[test]
    fn test_income_credits_wallet_and_skips_monthly() {
        let mut ledger = test_ledger();
        let user = test_user();

        let tx = ledger
            .apply_income(
                Currency::Idr,
                Decimal::from(20_000_000),
                &user,
                Some("iuran bulanan".to_string()),
                None,
                Utc::now(),
            )
            .unwrap();

        assert_eq!(tx.kind, TxKind::Income);
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(20_000_000));
        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.monthly.amount, Decimal::ZERO);
    }

    #[test]
    fn test_expense_within_daily_limit() {
        let mut ledger = test_ledger();
        ledger.config.daily_limit_usd = Decimal::from(20);
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(20), &user, None, None, now)
            .unwrap();

        let applied = ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(15),
                Category::Food,
                true,
                &user,
                None,
                now,
            )
            .unwrap();

        assert_eq!(ledger.daily.amount, Decimal::from(15));
        assert_eq!(ledger.wallet.balance(Currency::Usd), Decimal::from(5));
        assert_eq!(applied.daily_percent, Decimal::from(75));
        assert!(applied.crossed_daily.is_empty());
    }

    #[test]
    fn test_insufficient_balance_blocks_even_under_limit() {
        let mut ledger = test_ledger();
        ledger.config.daily_limit_usd = Decimal::from(20);
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(20), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(Currency::Usd, Decimal::from(15), Category::Food, true, &user, None, now)
            .unwrap();

        // Only 5 left: the balance gate fires regardless of limit headroom
        let err = ledger
            .apply_expense(Currency::Usd, Decimal::from(10), Category::Food, true, &user, None, now)
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(ledger.wallet.balance(Currency::Usd), Decimal::from(5));
        assert_eq!(ledger.transactions.len(), 2);
    }

    #[test]
    fn test_expense_over_limit_still_succeeds() {
        let mut ledger = test_ledger();
        ledger.config.daily_limit_usd = Decimal::from(10);
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();

        let applied = ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(30),
                Category::Shopping,
                true,
                &user,
                None,
                now,
            )
            .unwrap();

        // 300% of the daily limit: accrued in full, crossing every marker
        assert_eq!(applied.daily_percent, Decimal::from(300));
        assert_eq!(applied.crossed_daily, vec![80, 100, 150]);
        assert_eq!(ledger.daily.amount, Decimal::from(30));
    }

    #[test]
    fn test_monthly_boundary_exact_hundred_percent() {
        let mut ledger = test_ledger();
        ledger.config.monthly_limit_usd = Decimal::from(1_000);
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(2_000), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(950),
                Category::Bills,
                false,
                &user,
                None,
                now,
            )
            .unwrap();

        let applied = ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(50),
                Category::Bills,
                false,
                &user,
                None,
                now,
            )
            .unwrap();

        assert_eq!(ledger.monthly.amount, Decimal::from(1_000));
        assert_eq!(applied.monthly_percent, Decimal::from(100));
        // counts_daily=false never touches the daily window
        assert_eq!(ledger.daily.amount, Decimal::ZERO);
    }

    #[test]
    fn test_idr_expense_skips_spend_windows() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(1_000_000), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(
                Currency::Idr,
                Decimal::from(250_000),
                Category::Food,
                true,
                &user,
                None,
                now,
            )
            .unwrap();

        assert_eq!(ledger.daily.amount, Decimal::ZERO);
        assert_eq!(ledger.monthly.amount, Decimal::ZERO);
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(750_000));
    }

    #[test]
    fn test_conversion_moves_both_legs() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(32_000_000), &user, None, None, now)
            .unwrap();

        let tx = ledger
            .apply_conversion(
                Currency::Idr,
                Decimal::from(16_000_000),
                Currency::Usd,
                None,
                Some(Decimal::from(1_000)),
                &user,
                None,
                now,
            )
            .unwrap();

        assert_eq!(tx.kind, TxKind::Convert);
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(16_000_000));
        assert_eq!(ledger.wallet.balance(Currency::Usd), Decimal::from(1_000));
        assert_eq!(ledger.monthly.amount, Decimal::ZERO);
    }

    #[test]
    fn test_conversion_with_rate_updates_stored_rate() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();

        ledger
            .apply_conversion(
                Currency::Usd,
                Decimal::from(10),
                Currency::Idr,
                Some(Decimal::from(15_500)),
                None,
                &user,
                None,
                now,
            )
            .unwrap();

        assert_eq!(ledger.exchange_rate, Decimal::from(15_500));
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(155_000));
    }

    #[test]
    fn test_conversion_insufficient_funds() {
        let mut ledger = test_ledger();
        let user = test_user();

        let err = ledger
            .apply_conversion(
                Currency::Usd,
                Decimal::from(10),
                Currency::Idr,
                None,
                None,
                &user,
                None,
                Utc::now(),
            )
            .unwrap_err();

        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert!(ledger.transactions.is_empty());
    }

    #[test]
    fn test_rate_update_rejects_non_positive() {
        let mut ledger = test_ledger();
        let user = test_user();

        let err = ledger
            .apply_rate_update(Decimal::ZERO, &user, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRate(_)));

        ledger
            .apply_rate_update(Decimal::from(15_800), &user, Utc::now())
            .unwrap();
        assert_eq!(ledger.exchange_rate, Decimal::from(15_800));
    }

    #[test]
    fn test_reverse_expense_restores_prior_state() {
        let mut ledger = test_ledger();
        ledger.config.daily_limit_usd = Decimal::from(20);
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(20), &user, None, None, now)
            .unwrap();

        let before_wallet = ledger.wallet.clone();
        let before_daily = ledger.daily.amount;
        let before_monthly = ledger.monthly.amount;

        ledger
            .apply_expense(Currency::Usd, Decimal::from(15), Category::Food, true, &user, None, now)
            .unwrap();
        let reversed = ledger.reverse_last(user.id, &user, now).unwrap();

        assert!(reversed.canceled);
        assert_eq!(reversed.canceled_by.as_ref().map(|u| u.id), Some(user.id));
        assert_eq!(ledger.wallet, before_wallet);
        assert_eq!(ledger.daily.amount, before_daily);
        assert_eq!(ledger.monthly.amount, before_monthly);
        // The record survives, flagged
        assert_eq!(ledger.transactions.len(), 2);
    }

    #[test]
    fn test_reverse_twice_needs_two_transactions() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(100_000), &user, None, None, now)
            .unwrap();
        ledger.reverse_last(user.id, &user, now).unwrap();

        // The only transaction is now canceled: nothing left to reverse
        let err = ledger.reverse_last(user.id, &user, now).unwrap_err();
        assert_eq!(err, Error::NoTransactionToReverse(user.id));
    }

    #[test]
    fn test_reverse_picks_requesters_own_latest() {
        let mut ledger = test_ledger();
        let budi = UserRef::new(101, "Budi");
        let sari = UserRef::new(202, "Sari");
        let now = Utc::now();

        ledger
            .apply_income(Currency::Idr, Decimal::from(100_000), &budi, None, None, now)
            .unwrap();
        ledger
            .apply_income(Currency::Idr, Decimal::from(50_000), &sari, None, None, now)
            .unwrap();

        // Budi reverses: only his income comes back out
        ledger.reverse_last(budi.id, &budi, now).unwrap();
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::from(50_000));
    }

    #[test]
    fn test_reverse_conversion() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();
        ledger
            .apply_conversion(
                Currency::Usd,
                Decimal::from(10),
                Currency::Idr,
                Some(Decimal::from(16_000)),
                None,
                &user,
                None,
                now,
            )
            .unwrap();

        ledger.reverse_last(user.id, &user, now).unwrap();
        assert_eq!(ledger.wallet.balance(Currency::Usd), Decimal::from(100));
        assert_eq!(ledger.wallet.balance(Currency::Idr), Decimal::ZERO);
    }

    #[test]
    fn test_daily_window_rolls_across_local_midnight() {
        let mut ledger = test_ledger();
        let user = test_user();
        // 10:00 WIB on March 11
        let morning = Utc.with_ymd_and_hms(2024, 3, 11, 3, 0, 0).unwrap();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, morning)
            .unwrap();
        ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(10),
                Category::Food,
                true,
                &user,
                None,
                morning,
            )
            .unwrap();
        assert_eq!(ledger.daily.amount, Decimal::from(10));

        // Next local day (18:00 UTC = 01:00 WIB March 12): window resets
        let next_day = Utc.with_ymd_and_hms(2024, 3, 11, 18, 0, 0).unwrap();
        ledger
            .apply_expense(
                Currency::Usd,
                Decimal::from(5),
                Category::Food,
                true,
                &user,
                None,
                next_day,
            )
            .unwrap();
        assert_eq!(ledger.daily.amount, Decimal::from(5));
        // Monthly keeps accumulating across the day boundary
        assert_eq!(ledger.monthly.amount, Decimal::from(15));
    }

    #[test]
    fn test_summary_reflects_state() {
        let mut ledger = test_ledger();
        let user = test_user();
        let now = Utc::now();

        ledger
            .apply_income(Currency::Usd, Decimal::from(100), &user, None, None, now)
            .unwrap();
        ledger
            .apply_expense(Currency::Usd, Decimal::from(25), Category::Food, true, &user, None, now)
            .unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.balances[&Currency::Usd], Decimal::from(75));
        assert_eq!(summary.daily_spent, Decimal::from(25));
        assert_eq!(summary.categories[&Category::Food], Decimal::from(25));
        assert_eq!(summary.live_transactions, 2);
    }
}
