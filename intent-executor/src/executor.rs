//! The intent state machine
//!
//! One [`Executor`] owns the ledger registry and pending tables; the actor
//! in [`crate::actor`] serializes all calls into it. Each public method is
//! one complete state transition: by the time it returns, either the ledger
//! mutated and persistence was requested, or nothing changed at all.

use crate::collaborators::{AuthorizationOracle, GroupConfigProvider, NotificationSink};
use crate::config::Config;
use crate::intent::{self, Intent, RawIntent, ValidatedIntent};
use crate::metrics::Metrics;
use crate::outcome::{Applied, Outcome, RejectReason, Rejection};
use crate::pending::{ConfirmationToken, HoldId, PendingTables, RedeemError};
use chrono::{DateTime, Utc};
use group_ledger::{GroupId, LedgerRegistry, RegistryStats, UserRef};
use limit_policy::{
    classify_spend, evaluate_big_transaction, ApprovalDecision, VelocityGuard, WarningLevel,
};
use snapshot_store::SnapshotBackend;
use std::sync::Arc;

/// The intent executor: validation, policy, dispatch, pending protocols
pub struct Executor {
    registry: LedgerRegistry,
    pending: PendingTables,
    velocity: VelocityGuard,
    config: Config,
    notifier: Arc<dyn NotificationSink>,
    authorizer: Arc<dyn AuthorizationOracle>,
    config_provider: Arc<dyn GroupConfigProvider>,
    store: Arc<dyn SnapshotBackend>,
    metrics: Metrics,
}

impl Executor {
    /// Build an executor over a registry restored from a snapshot
    pub fn new(
        registry: LedgerRegistry,
        config: Config,
        notifier: Arc<dyn NotificationSink>,
        authorizer: Arc<dyn AuthorizationOracle>,
        config_provider: Arc<dyn GroupConfigProvider>,
        store: Arc<dyn SnapshotBackend>,
    ) -> Self {
        let velocity = VelocityGuard::new(config.velocity.clone());
        Self {
            registry,
            pending: PendingTables::new(),
            velocity,
            config,
            notifier,
            authorizer,
            config_provider,
            store,
            metrics: Metrics::default(),
        }
    }

    /// Process one intent from the chat layer
    pub async fn submit(
        &mut self,
        group: GroupId,
        user: UserRef,
        raw: RawIntent,
        now: DateTime<Utc>,
    ) -> Outcome {
        self.metrics.intents_total.inc();

        let validated = match intent::validate(&raw) {
            Ok(v) => v,
            Err(msg) => {
                tracing::debug!(%group, user = %user.id, %msg, "intent failed validation");
                return self.reject(Rejection::new(
                    RejectReason::InvalidIntent,
                    format!("❌ Permintaan tidak dikenali: {}.", msg),
                ));
            }
        };

        let group_config = self.config_provider.config_for(group).await;

        // Read-only path: no velocity, no policy, no persistence
        if let Intent::Query = validated.intent {
            let ledger = self
                .registry
                .get_or_create(group, group_config.clone(), now);
            ledger.config = group_config;
            ledger.roll_periods(now);
            return Outcome::Report(ledger.summary());
        }

        if let Err(err) = self.velocity.check(group, user.id, now) {
            return self.reject(Rejection::new(
                RejectReason::RateLimited,
                format!("❌ Terlalu banyak transaksi. Tunggu sebentar ya. ({})", err),
            ));
        }

        // Big-transaction policy: hold before any ledger mutation
        if let Some(amount) = validated.intent.approval_amount() {
            let is_admin = self.authorizer.is_admin(group, user.id).await;
            if evaluate_big_transaction(&group_config, amount, is_admin) == ApprovalDecision::Hold {
                let hold_id = self.pending.register_approval(group, user.clone(), raw, now);
                self.sync_pending_gauges();
                tracing::info!(%group, user = %user.id, %amount, %hold_id, "big transaction held");
                return Outcome::PendingApproval {
                    hold_id,
                    message: format!(
                        "⏳ Transaksi besar ({}) menunggu persetujuan admin.",
                        amount
                    ),
                };
            }
        }

        // Confirmation sub-protocol: classify prospectively, hold if loud
        if self.needs_confirmation(group, &validated, group_config.clone(), now) {
            let (token, expires_at) = self.pending.register_confirmation(
                group,
                user.clone(),
                raw,
                now,
                self.config.confirmation_ttl_secs,
            );
            self.sync_pending_gauges();
            tracing::info!(%group, user = %user.id, %token, "confirmation requested");
            return Outcome::PendingConfirmation {
                token,
                expires_at,
                message: format!(
                    "⚠️ Transaksi ini melebihi batas wajar. Konfirmasi dalam {} detik?",
                    self.config.confirmation_ttl_secs
                ),
            };
        }

        self.apply(group, &user, validated, now).await
    }

    /// Redeem a confirmation token and apply the held intent
    pub async fn confirm(
        &mut self,
        group: GroupId,
        user: UserRef,
        token: ConfirmationToken,
        now: DateTime<Utc>,
    ) -> Outcome {
        let confirmation = match self
            .pending
            .redeem_confirmation(group, token, user.id, now)
        {
            Ok(c) => c,
            Err(err) => return self.reject(redeem_rejection(err)),
        };
        self.sync_pending_gauges();

        // The world may have moved since registration: validate again
        let validated = match intent::validate(&confirmation.raw) {
            Ok(v) => v,
            Err(msg) => {
                return self.reject(Rejection::new(
                    RejectReason::InvalidIntent,
                    format!("❌ Permintaan tidak dikenali: {}.", msg),
                ))
            }
        };

        self.apply(group, &user, validated, now).await
    }

    /// Discard a pending confirmation
    pub async fn decline(
        &mut self,
        group: GroupId,
        user: UserRef,
        token: ConfirmationToken,
    ) -> Outcome {
        match self.pending.decline_confirmation(group, token, user.id) {
            Some(_) => {
                self.sync_pending_gauges();
                Outcome::Discarded {
                    message: "👍 Oke, transaksi dibatalkan.".to_string(),
                }
            }
            None => self.reject(redeem_rejection(RedeemError::NotFound)),
        }
    }

    /// Apply a held big transaction (admins only)
    ///
    /// The ledger mutation happens here, at approval time: an approved
    /// income credits the wallet now, not when it was requested.
    pub async fn approve(
        &mut self,
        group: GroupId,
        admin: UserRef,
        hold_id: HoldId,
        now: DateTime<Utc>,
    ) -> Outcome {
        if !self.authorizer.is_admin(group, admin.id).await {
            return self.reject(Rejection::new(
                RejectReason::NotAuthorized,
                "❌ Hanya admin yang bisa menyetujui transaksi besar.",
            ));
        }

        let hold = match self.pending.take_approval(group, hold_id) {
            Some(h) => h,
            None => {
                return self.reject(Rejection::new(
                    RejectReason::UnknownConfirmation,
                    "❌ Tidak ada transaksi yang menunggu persetujuan itu.",
                ))
            }
        };
        self.sync_pending_gauges();

        let validated = match intent::validate(&hold.raw) {
            Ok(v) => v,
            Err(msg) => {
                return self.reject(Rejection::new(
                    RejectReason::InvalidIntent,
                    format!("❌ Permintaan tidak dikenali: {}.", msg),
                ))
            }
        };

        tracing::info!(%group, admin = %admin.id, requester = %hold.requester.id, %hold_id, "hold approved");
        // Applied under the original requester's name
        let requester = hold.requester.clone();
        self.apply(group, &requester, validated, now).await
    }

    /// Discard a held big transaction (admins only)
    pub async fn reject_hold(
        &mut self,
        group: GroupId,
        admin: UserRef,
        hold_id: HoldId,
    ) -> Outcome {
        if !self.authorizer.is_admin(group, admin.id).await {
            return self.reject(Rejection::new(
                RejectReason::NotAuthorized,
                "❌ Hanya admin yang bisa menolak transaksi besar.",
            ));
        }

        match self.pending.take_approval(group, hold_id) {
            Some(hold) => {
                self.sync_pending_gauges();
                self.notifier
                    .deliver(
                        group,
                        format!(
                            "❌ Transaksi besar dari {} ditolak admin.",
                            hold.requester.display_name
                        ),
                        WarningLevel::None,
                    )
                    .await;
                Outcome::Discarded {
                    message: "Transaksi ditolak.".to_string(),
                }
            }
            None => self.reject(Rejection::new(
                RejectReason::UnknownConfirmation,
                "❌ Tidak ada transaksi yang menunggu persetujuan itu.",
            )),
        }
    }

    /// Expire overdue confirmations and notify their groups
    pub async fn sweep(&mut self, now: DateTime<Utc>) {
        let expired = self.pending.sweep_expired(now);
        if expired.is_empty() {
            return;
        }
        self.sync_pending_gauges();

        for (group, confirmation) in expired {
            tracing::info!(%group, token = %confirmation.token, "confirmation expired");
            self.notifier
                .deliver(
                    group,
                    format!(
                        "⌛ Konfirmasi dari {} kedaluwarsa, transaksi dibatalkan.",
                        confirmation.user.display_name
                    ),
                    WarningLevel::None,
                )
                .await;
        }
    }

    /// Periodic maintenance: reconcile every ledger, then snapshot
    pub async fn maintain(&mut self, now: DateTime<Utc>) {
        let groups: Vec<GroupId> = self.registry.groups().keys().copied().collect();
        for id in groups {
            if let Some(ledger) = self.registry.get_mut(id) {
                let report = ledger.reconcile(now);
                if !report.is_clean() {
                    self.metrics.drift_corrections_total.inc();
                    tracing::warn!(group = %id, ?report, "periodic reconciliation corrected drift");
                }
            }
        }
        self.persist().await;
    }

    /// Best-effort snapshot of the current state
    ///
    /// A failure is logged and counted, never propagated: in-memory state
    /// stays authoritative and the next save will capture it.
    pub async fn persist(&mut self) {
        if let Err(err) = self.store.save(self.registry.groups()).await {
            self.metrics.persistence_failures_total.inc();
            tracing::error!(%err, "snapshot save failed; ledger state unaffected");
        }
    }

    /// System-wide totals for the admin panel
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// The ledger registry (read access for embedding code and tests)
    pub fn registry(&self) -> &LedgerRegistry {
        &self.registry
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Dispatch a validated intent to the ledger
    ///
    /// The entire mutation (balance check, balance change, log append,
    /// aggregate update) runs synchronously inside this call; the awaits
    /// happen only after the ledger is consistent again.
    async fn apply(
        &mut self,
        group: GroupId,
        user: &UserRef,
        validated: ValidatedIntent,
        now: DateTime<Utc>,
    ) -> Outcome {
        let group_config = self.config_provider.config_for(group).await;
        let ledger = self.registry.get_or_create(group, group_config.clone(), now);
        ledger.config = group_config.clone();

        let outcome = match validated.intent {
            Intent::Income {
                currency,
                amount,
                category,
                description,
            } => match ledger.apply_income(currency, amount, user, description, category, now) {
                Ok(tx) => Outcome::Applied(Applied {
                    message: format!(
                        "📈 Pemasukan tercatat: {} {} dari {}.",
                        currency, amount, user.display_name
                    ),
                    tx,
                    assessment: None,
                    crossed_markers: Vec::new(),
                }),
                Err(err) => return self.reject(err.into()),
            },

            Intent::Expense {
                currency,
                amount,
                category,
                counts_daily,
                description,
            } => {
                match ledger.apply_expense(
                    currency,
                    amount,
                    category,
                    counts_daily,
                    user,
                    description,
                    now,
                ) {
                    Ok(applied) => {
                        let assessment =
                            classify_spend(applied.daily_percent, applied.monthly_percent);
                        // Group-wide announcement only on a fresh marker
                        // crossing; the reply carries the assessment every
                        // time.
                        if assessment.level > WarningLevel::None
                            && !applied.crossed_daily.is_empty()
                        {
                            self.notifier
                                .deliver(group, assessment.advisory.clone(), assessment.level)
                                .await;
                        }
                        Outcome::Applied(Applied {
                            message: format!(
                                "📉 Pengeluaran tercatat: {} {} ({}).",
                                currency,
                                amount,
                                category.label()
                            ),
                            tx: applied.tx,
                            assessment: Some(assessment),
                            crossed_markers: applied.crossed_daily,
                        })
                    }
                    Err(err) => return self.reject(err.into()),
                }
            }

            Intent::Convert {
                source,
                amount,
                target,
                rate,
                target_amount,
                description,
            } => {
                match ledger.apply_conversion(
                    source,
                    amount,
                    target,
                    rate,
                    target_amount,
                    user,
                    description,
                    now,
                ) {
                    Ok(tx) => {
                        let credited = tx.target_amount.unwrap_or_default();
                        Outcome::Applied(Applied {
                            message: format!(
                                "🔁 Konversi tercatat: {} {} → {} {}.",
                                source, amount, target, credited
                            ),
                            tx,
                            assessment: None,
                            crossed_markers: Vec::new(),
                        })
                    }
                    Err(err) => return self.reject(err.into()),
                }
            }

            Intent::Cancel { target_user } => {
                let target = target_user.unwrap_or(user.id);
                if target != user.id && !self.authorizer.is_admin(group, user.id).await {
                    return self.reject(Rejection::new(
                        RejectReason::NotAuthorized,
                        "❌ Hanya admin yang bisa membatalkan transaksi orang lain.",
                    ));
                }
                // Re-borrow: the admin check above released the ledger
                let ledger = self.registry.get_or_create(group, group_config.clone(), now);
                match ledger.reverse_last(target, user, now) {
                    Ok(tx) => Outcome::Applied(Applied {
                        message: format!("↩️ Transaksi {} dibatalkan.", tx.id),
                        tx,
                        assessment: None,
                        crossed_markers: Vec::new(),
                    }),
                    Err(err) => return self.reject(err.into()),
                }
            }

            Intent::RateUpdate { rate } => match ledger.apply_rate_update(rate, user, now) {
                Ok(tx) => Outcome::Applied(Applied {
                    message: format!("💱 Kurs diperbarui: Rp {} per USD.", rate),
                    tx,
                    assessment: None,
                    crossed_markers: Vec::new(),
                }),
                Err(err) => return self.reject(err.into()),
            },

            Intent::Query => {
                ledger.roll_periods(now);
                return Outcome::Report(ledger.summary());
            }
        };

        self.metrics.applied_total.inc();
        self.persist().await;
        outcome
    }

    /// Whether this intent must pass through the confirmation round
    fn needs_confirmation(
        &mut self,
        group: GroupId,
        validated: &ValidatedIntent,
        group_config: group_ledger::GroupConfig,
        now: DateTime<Utc>,
    ) -> bool {
        if validated.requires_confirm {
            return true;
        }

        if let Intent::Expense {
            currency,
            amount,
            counts_daily,
            ..
        } = &validated.intent
        {
            let ledger = self.registry.get_or_create(group, group_config.clone(), now);
            ledger.config = group_config;
            let (daily, monthly) =
                ledger.prospective_percentages(*currency, *amount, *counts_daily, now);
            return classify_spend(daily, monthly).level.needs_confirmation();
        }

        false
    }

    fn reject(&self, rejection: Rejection) -> Outcome {
        self.metrics.rejections_total.inc();
        Outcome::Rejected(rejection)
    }

    fn sync_pending_gauges(&self) {
        self.metrics
            .set_pending(self.pending.confirmation_count(), self.pending.approval_count());
    }
}

fn redeem_rejection(err: RedeemError) -> Rejection {
    let message = match err {
        RedeemError::NotFound => "❌ Tidak ada konfirmasi yang menunggu.",
        RedeemError::Expired => "⌛ Konfirmasi sudah kedaluwarsa.",
        RedeemError::WrongUser => "❌ Konfirmasi ini bukan milik Anda.",
    };
    Rejection::new(RejectReason::UnknownConfirmation, message)
}
