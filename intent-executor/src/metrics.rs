//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `executor_intents_total` - Intents received (valid or not)
//! - `executor_applied_total` - Intents that mutated the ledger
//! - `executor_rejections_total` - Typed rejections returned
//! - `executor_pending_confirmations` - Live confirmation tokens
//! - `executor_pending_approvals` - Live approval holds
//! - `executor_persistence_failures_total` - Best-effort saves that failed
//! - `executor_drift_corrections_total` - Aggregates fixed by reconciliation

use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Intents received
    pub intents_total: IntCounter,

    /// Intents applied to a ledger
    pub applied_total: IntCounter,

    /// Rejections returned
    pub rejections_total: IntCounter,

    /// Live confirmation tokens
    pub pending_confirmations: IntGauge,

    /// Live approval holds
    pub pending_approvals: IntGauge,

    /// Failed snapshot saves
    pub persistence_failures_total: IntCounter,

    /// Aggregates corrected by reconciliation
    pub drift_corrections_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let intents_total = IntCounter::with_opts(Opts::new(
            "executor_intents_total",
            "Intents received (valid or not)",
        ))?;
        registry.register(Box::new(intents_total.clone()))?;

        let applied_total = IntCounter::with_opts(Opts::new(
            "executor_applied_total",
            "Intents that mutated the ledger",
        ))?;
        registry.register(Box::new(applied_total.clone()))?;

        let rejections_total = IntCounter::with_opts(Opts::new(
            "executor_rejections_total",
            "Typed rejections returned",
        ))?;
        registry.register(Box::new(rejections_total.clone()))?;

        let pending_confirmations = IntGauge::with_opts(Opts::new(
            "executor_pending_confirmations",
            "Live confirmation tokens",
        ))?;
        registry.register(Box::new(pending_confirmations.clone()))?;

        let pending_approvals = IntGauge::with_opts(Opts::new(
            "executor_pending_approvals",
            "Live approval holds",
        ))?;
        registry.register(Box::new(pending_approvals.clone()))?;

        let persistence_failures_total = IntCounter::with_opts(Opts::new(
            "executor_persistence_failures_total",
            "Best-effort snapshot saves that failed",
        ))?;
        registry.register(Box::new(persistence_failures_total.clone()))?;

        let drift_corrections_total = IntCounter::with_opts(Opts::new(
            "executor_drift_corrections_total",
            "Aggregates corrected by reconciliation",
        ))?;
        registry.register(Box::new(drift_corrections_total.clone()))?;

        Ok(Self {
            intents_total,
            applied_total,
            rejections_total,
            pending_confirmations,
            pending_approvals,
            persistence_failures_total,
            drift_corrections_total,
            registry,
        })
    }

    /// Sync the pending gauges from the tables
    pub fn set_pending(&self, confirmations: usize, approvals: usize) {
        self.pending_confirmations.set(confirmations as i64);
        self.pending_approvals.set(approvals as i64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
