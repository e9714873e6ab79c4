//! Limit policy engine
//!
//! Classifies prospective and recorded spending against the group's
//! advisory limits, decides when a transaction needs admin approval, and
//! rate-limits how fast a single user may write transactions.
//!
//! Spending limits here are informational guardrails: classification never
//! rejects an expense. The only hard gates in the system are insufficient
//! balance (the ledger's job) and the optional big-transaction approval
//! hold decided in this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod approval;
pub mod error;
pub mod policy;
pub mod types;
pub mod velocity;

pub use approval::{evaluate_big_transaction, ApprovalDecision};
pub use error::{Error, Result};
pub use policy::{classify_spend, LimitAssessment};
pub use types::WarningLevel;
pub use velocity::{VelocityConfig, VelocityGuard};
