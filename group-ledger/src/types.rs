//! Core types for the group ledger
//!
//! All money is exact `Decimal` arithmetic, identifiers are newtypes, and
//! transaction records are immutable once appended (cancellation only flags
//! them).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Chat group identifier (the platform's chat id)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GroupId(i64);

impl GroupId {
    /// Create from a raw chat id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw chat id
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform user identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UserId(i64);

impl UserId {
    /// Create from a raw user id
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw user id
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier (UUIDv7, so ids are unique and time-ordered)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TxId(Uuid);

impl TxId {
    /// Mint a fresh time-ordered id
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Indonesian Rupiah
    Idr,
    /// US Dollar
    Usd,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Idr => "IDR",
            Currency::Usd => "USD",
        }
    }

    /// Parse from an ISO code (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IDR" => Some(Currency::Idr),
            "USD" => Some(Currency::Usd),
            _ => None,
        }
    }

    /// Reconciliation tolerance: 1 rupiah, 1 cent
    pub fn tolerance(&self) -> Decimal {
        match self {
            Currency::Idr => Decimal::ONE,
            Currency::Usd => Decimal::new(1, 2),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Expense category (closed set; anything else is rejected at the boundary)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Food and drink
    Food,
    /// Transport and fuel
    Transport,
    /// Recurring bills and utilities
    Bills,
    /// Shopping and equipment
    Shopping,
    /// Entertainment and events
    Entertainment,
    /// Health
    Health,
    /// Everything else
    Other,
}

impl Category {
    /// Parse the classifier's category string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "food" => Some(Category::Food),
            "transport" => Some(Category::Transport),
            "bills" => Some(Category::Bills),
            "shopping" => Some(Category::Shopping),
            "entertainment" => Some(Category::Entertainment),
            "health" => Some(Category::Health),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    /// User-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Makanan",
            Category::Transport => "Transportasi",
            Category::Bills => "Tagihan",
            Category::Shopping => "Belanja",
            Category::Entertainment => "Hiburan",
            Category::Health => "Kesehatan",
            Category::Other => "Lainnya",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Acting user: id plus display name for rendered messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Platform user id
    pub id: UserId,
    /// Display name at the time of the action
    pub display_name: String,
}

impl UserRef {
    /// Create a user reference
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: display_name.into(),
        }
    }
}

/// Transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Money in
    Income,
    /// Money out
    Expense,
    /// Currency conversion between the two wallets
    Convert,
    /// Exchange rate update (records the new rate, moves no money)
    RateUpdate,
}

/// A ledger transaction
///
/// Append-only: records are never deleted, only flagged canceled with the
/// canceling actor and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique, time-ordered id
    pub id: TxId,

    /// When the transaction was applied
    pub at: DateTime<Utc>,

    /// Who performed it
    pub user: UserRef,

    /// Kind
    pub kind: TxKind,

    /// Amount in `currency` (for rate updates: the new rate)
    pub amount: Decimal,

    /// Currency of `amount`
    pub currency: Currency,

    /// Target currency (conversions only)
    pub target_currency: Option<Currency>,

    /// Amount credited to the target currency (conversions only)
    pub target_amount: Option<Decimal>,

    /// Expense category (expenses; optionally incomes)
    pub category: Option<Category>,

    /// Free-text description from the chat message
    pub description: Option<String>,

    /// Whether a USD expense counts toward the daily limit
    pub counts_daily: bool,

    /// Cancellation flag
    pub canceled: bool,

    /// Who canceled it
    pub canceled_by: Option<UserRef>,

    /// When it was canceled
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// True when the transaction still contributes to balances/aggregates
    pub fn is_live(&self) -> bool {
        !self.canceled
    }
}

/// Per-user accumulated statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// Number of transactions authored
    pub transaction_count: u64,

    /// Signed net amount per currency (income +, expense -)
    pub net_by_currency: HashMap<Currency, Decimal>,

    /// Last time the user touched the ledger
    pub last_active: DateTime<Utc>,
}

impl UserStats {
    /// Fresh stats for a first-seen user
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            transaction_count: 0,
            net_by_currency: HashMap::new(),
            last_active: now,
        }
    }

    /// Count one authored transaction
    pub fn record_transaction(&mut self, at: DateTime<Utc>) {
        self.transaction_count += 1;
        self.last_active = at;
    }

    /// Fold a signed amount into the per-currency net
    pub fn add_net(&mut self, currency: Currency, signed_amount: Decimal) {
        *self.net_by_currency.entry(currency).or_insert(Decimal::ZERO) += signed_amount;
    }
}

/// Wallet: balance per supported currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balances: HashMap<Currency, Decimal>,
}

impl Wallet {
    /// Empty wallet with both currencies zeroed
    pub fn new() -> Self {
        let mut balances = HashMap::new();
        balances.insert(Currency::Idr, Decimal::ZERO);
        balances.insert(Currency::Usd, Decimal::ZERO);
        Self { balances }
    }

    /// Current balance (zero when the currency was never touched)
    pub fn balance(&self, currency: Currency) -> Decimal {
        self.balances.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// Add to a balance
    pub fn credit(&mut self, currency: Currency, amount: Decimal) {
        *self.balances.entry(currency).or_insert(Decimal::ZERO) += amount;
    }

    /// Subtract from a balance (callers gate on `balance()` first)
    pub fn debit(&mut self, currency: Currency, amount: Decimal) {
        *self.balances.entry(currency).or_insert(Decimal::ZERO) -= amount;
    }

    /// All balances
    pub fn balances(&self) -> &HashMap<Currency, Decimal> {
        &self.balances
    }

    pub(crate) fn set_balance(&mut self, currency: Currency, value: Decimal) {
        self.balances.insert(currency, value);
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
