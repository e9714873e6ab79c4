//! Error types for ledger operations

use crate::types::{Currency, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every variant is a typed rejection the chat layer can render; nothing
/// here is a panic path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Amount missing, zero, negative, or not representable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance too low for the requested debit
    #[error("Insufficient {currency} funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Currency being debited
        currency: Currency,
        /// Amount the operation needs
        required: Decimal,
        /// Balance actually available
        available: Decimal,
    },

    /// The user has no non-canceled transaction to reverse
    #[error("No transaction to reverse for user {0}")]
    NoTransactionToReverse(UserId),

    /// Exchange rate missing or non-positive
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}
