//! Structured intents and boundary validation
//!
//! The upstream classifier is an opaque oracle: whatever it emits is
//! untrusted until it parses cleanly into an [`Intent`] variant here.
//! Nothing downstream of this module ever sees a malformed field.

use group_ledger::{Category, Currency, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw classifier output, every field optional and unvalidated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIntent {
    /// Intent kind (`income`, `expense`, `convert`, `cancel`,
    /// `rate_update`, `query`)
    pub kind: Option<String>,

    /// Amount in `currency`
    pub amount: Option<f64>,

    /// Currency code
    pub currency: Option<String>,

    /// Target currency code (conversions)
    pub target_currency: Option<String>,

    /// Target amount (conversions)
    pub target_amount: Option<f64>,

    /// Exchange rate (conversions, rate updates)
    pub rate: Option<f64>,

    /// Expense category
    pub category: Option<String>,

    /// Free-text description
    pub description: Option<String>,

    /// Whether a USD expense counts toward the daily limit
    pub counts_to_daily_limit: Option<bool>,

    /// Classifier asked for an explicit confirmation round
    pub requires_confirm: Option<bool>,

    /// Cancel on behalf of this user (admins only)
    pub target_user_id: Option<i64>,
}

/// A validated intent, ready for policy checks and dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Money in
    Income {
        /// Credited currency
        currency: Currency,
        /// Positive amount
        amount: Decimal,
        /// Optional category
        category: Option<Category>,
        /// Description from the message
        description: Option<String>,
    },
    /// Money out
    Expense {
        /// Debited currency
        currency: Currency,
        /// Positive amount
        amount: Decimal,
        /// Category (defaults to `Other` when the classifier omits it)
        category: Category,
        /// Whether a USD expense counts toward the daily limit
        counts_daily: bool,
        /// Description from the message
        description: Option<String>,
    },
    /// Currency conversion
    Convert {
        /// Debited currency
        source: Currency,
        /// Positive amount to convert
        amount: Decimal,
        /// Credited currency
        target: Currency,
        /// Target units per source unit, when given
        rate: Option<Decimal>,
        /// Explicit target amount, when given
        target_amount: Option<Decimal>,
        /// Description from the message
        description: Option<String>,
    },
    /// Reverse the latest transaction
    Cancel {
        /// Someone else's transaction (requires admin standing)
        target_user: Option<UserId>,
    },
    /// Set the exchange rate
    RateUpdate {
        /// New IDR-per-USD rate
        rate: Decimal,
    },
    /// Read-only balance/limit summary
    Query,
}

/// Validated intent plus the classifier's confirmation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedIntent {
    /// The intent itself
    pub intent: Intent,
    /// Force the confirmation round regardless of warning level
    pub requires_confirm: bool,
}

impl Intent {
    /// Amount the big-transaction policy inspects (income/expense only)
    pub fn approval_amount(&self) -> Option<Decimal> {
        match self {
            Intent::Income { amount, .. } | Intent::Expense { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    /// Whether this intent writes to the ledger (velocity guard applies)
    pub fn is_write(&self) -> bool {
        !matches!(self, Intent::Query)
    }

    /// Short label for logs and metrics
    pub fn kind_label(&self) -> &'static str {
        match self {
            Intent::Income { .. } => "income",
            Intent::Expense { .. } => "expense",
            Intent::Convert { .. } => "convert",
            Intent::Cancel { .. } => "cancel",
            Intent::RateUpdate { .. } => "rate_update",
            Intent::Query => "query",
        }
    }
}

/// Validate raw classifier output into an [`Intent`]
///
/// Every field is checked independently; the first problem found is
/// returned as the rejection message.
pub fn validate(raw: &RawIntent) -> std::result::Result<ValidatedIntent, String> {
    let kind = raw
        .kind
        .as_deref()
        .ok_or_else(|| "missing intent kind".to_string())?;

    let intent = match kind {
        "income" => Intent::Income {
            currency: require_currency(raw.currency.as_deref())?,
            amount: require_amount(raw.amount, "amount")?,
            category: optional_category(raw.category.as_deref())?,
            description: raw.description.clone(),
        },
        "expense" => Intent::Expense {
            currency: require_currency(raw.currency.as_deref())?,
            amount: require_amount(raw.amount, "amount")?,
            category: optional_category(raw.category.as_deref())?.unwrap_or(Category::Other),
            counts_daily: raw.counts_to_daily_limit.unwrap_or(true),
            description: raw.description.clone(),
        },
        "convert" | "conversion" => {
            let source = require_currency(raw.currency.as_deref())?;
            let target = require_currency(raw.target_currency.as_deref())?;
            if source == target {
                return Err(format!("cannot convert {} to itself", source));
            }
            Intent::Convert {
                source,
                amount: require_amount(raw.amount, "amount")?,
                target,
                rate: optional_amount(raw.rate, "rate")?,
                target_amount: optional_amount(raw.target_amount, "target_amount")?,
                description: raw.description.clone(),
            }
        }
        "cancel" => Intent::Cancel {
            target_user: raw.target_user_id.map(UserId::new),
        },
        "rate_update" => Intent::RateUpdate {
            rate: require_amount(raw.rate, "rate")?,
        },
        "query" => Intent::Query,
        other => return Err(format!("unknown intent kind '{}'", other)),
    };

    Ok(ValidatedIntent {
        intent,
        requires_confirm: raw.requires_confirm.unwrap_or(false),
    })
}

fn require_currency(code: Option<&str>) -> std::result::Result<Currency, String> {
    let code = code.ok_or_else(|| "missing currency".to_string())?;
    Currency::parse(code).ok_or_else(|| format!("unsupported currency '{}'", code))
}

fn require_amount(value: Option<f64>, field: &str) -> std::result::Result<Decimal, String> {
    let value = value.ok_or_else(|| format!("missing {}", field))?;
    to_positive_decimal(value, field)
}

fn optional_amount(
    value: Option<f64>,
    field: &str,
) -> std::result::Result<Option<Decimal>, String> {
    value.map(|v| to_positive_decimal(v, field)).transpose()
}

fn to_positive_decimal(value: f64, field: &str) -> std::result::Result<Decimal, String> {
    if !value.is_finite() {
        return Err(format!("{} is not a finite number", field));
    }
    let decimal =
        Decimal::try_from(value).map_err(|_| format!("{} is out of range", field))?;
    if decimal <= Decimal::ZERO {
        return Err(format!("{} must be positive", field));
    }
    Ok(decimal)
}

fn optional_category(
    value: Option<&str>,
) -> std::result::Result<Option<Category>, String> {
    match value {
        None => Ok(None),
        Some(s) => Category::parse(s)
            .map(Some)
            .ok_or_else(|| format!("unknown category '{}'", s)),
    }
}
