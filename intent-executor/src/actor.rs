//! Actor-based concurrency for the executor
//!
//! One task owns the [`Executor`] (and through it every group ledger), so
//! all intent processing is serialized: there is no parallel mutation of a
//! ledger anywhere in the process. Long-latency work (classifier calls,
//! message delivery) happens outside, before or after the mailbox.
//!
//! The select loop also drives the two scheduled jobs: the
//! pending-confirmation expiry sweep and periodic reconcile-and-snapshot
//! maintenance. Both are idempotent, and ticks that fire while a message is
//! being handled are delayed, never stacked.

use crate::collaborators::{AuthorizationOracle, GroupConfigProvider, NotificationSink};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::intent::RawIntent;
use crate::outcome::Outcome;
use crate::pending::{ConfirmationToken, HoldId};
use chrono::Utc;
use group_ledger::{GroupId, LedgerRegistry, RegistryStats, UserRef};
use snapshot_store::SnapshotBackend;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Message sent to the executor actor
pub enum ExecutorMessage {
    /// Process one intent
    Submit {
        /// Target group
        group: GroupId,
        /// Acting user
        user: UserRef,
        /// Untrusted classifier output
        raw: RawIntent,
        /// Reply channel
        response: oneshot::Sender<Outcome>,
    },

    /// Redeem a confirmation token
    Confirm {
        /// Target group
        group: GroupId,
        /// Acting user
        user: UserRef,
        /// Token from the original prompt
        token: ConfirmationToken,
        /// Reply channel
        response: oneshot::Sender<Outcome>,
    },

    /// Discard a confirmation token
    Decline {
        /// Target group
        group: GroupId,
        /// Acting user
        user: UserRef,
        /// Token from the original prompt
        token: ConfirmationToken,
        /// Reply channel
        response: oneshot::Sender<Outcome>,
    },

    /// Approve a held big transaction
    Approve {
        /// Target group
        group: GroupId,
        /// Approving admin
        admin: UserRef,
        /// Hold handle
        hold_id: HoldId,
        /// Reply channel
        response: oneshot::Sender<Outcome>,
    },

    /// Reject a held big transaction
    RejectHold {
        /// Target group
        group: GroupId,
        /// Rejecting admin
        admin: UserRef,
        /// Hold handle
        hold_id: HoldId,
        /// Reply channel
        response: oneshot::Sender<Outcome>,
    },

    /// System-wide totals
    Stats {
        /// Reply channel
        response: oneshot::Sender<RegistryStats>,
    },

    /// Snapshot now (shutdown paths, tests)
    Flush {
        /// Reply channel
        response: oneshot::Sender<()>,
    },

    /// Stop the actor after a final snapshot
    Shutdown,
}

/// Actor that processes executor messages
pub struct ExecutorActor {
    executor: Executor,
    mailbox: mpsc::Receiver<ExecutorMessage>,
    sweep_interval: Duration,
    save_interval: Duration,
}

impl ExecutorActor {
    /// Create a new actor
    pub fn new(
        executor: Executor,
        mailbox: mpsc::Receiver<ExecutorMessage>,
        sweep_interval: Duration,
        save_interval: Duration,
    ) -> Self {
        Self {
            executor,
            mailbox,
            sweep_interval,
            save_interval,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut sweep_timer = interval(self.sweep_interval);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut save_timer = interval(self.save_interval);
        save_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(msg) = self.mailbox.recv() => {
                    match msg {
                        ExecutorMessage::Shutdown => {
                            self.executor.persist().await;
                            break;
                        }
                        _ => self.handle_message(msg).await,
                    }
                }

                _ = sweep_timer.tick() => {
                    self.executor.sweep(Utc::now()).await;
                }

                _ = save_timer.tick() => {
                    self.executor.maintain(Utc::now()).await;
                }

                // Mailbox closed
                else => {
                    self.executor.persist().await;
                    break;
                }
            }
        }
    }

    /// Handle a single message
    async fn handle_message(&mut self, msg: ExecutorMessage) {
        match msg {
            ExecutorMessage::Submit {
                group,
                user,
                raw,
                response,
            } => {
                let outcome = self.executor.submit(group, user, raw, Utc::now()).await;
                let _ = response.send(outcome);
            }

            ExecutorMessage::Confirm {
                group,
                user,
                token,
                response,
            } => {
                let outcome = self.executor.confirm(group, user, token, Utc::now()).await;
                let _ = response.send(outcome);
            }

            ExecutorMessage::Decline {
                group,
                user,
                token,
                response,
            } => {
                let outcome = self.executor.decline(group, user, token).await;
                let _ = response.send(outcome);
            }

            ExecutorMessage::Approve {
                group,
                admin,
                hold_id,
                response,
            } => {
                let outcome = self
                    .executor
                    .approve(group, admin, hold_id, Utc::now())
                    .await;
                let _ = response.send(outcome);
            }

            ExecutorMessage::RejectHold {
                group,
                admin,
                hold_id,
                response,
            } => {
                let outcome = self.executor.reject_hold(group, admin, hold_id).await;
                let _ = response.send(outcome);
            }

            ExecutorMessage::Stats { response } => {
                let _ = response.send(self.executor.stats());
            }

            ExecutorMessage::Flush { response } => {
                self.executor.persist().await;
                let _ = response.send(());
            }

            ExecutorMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct ExecutorHandle {
    sender: mpsc::Sender<ExecutorMessage>,
}

impl ExecutorHandle {
    /// Create a handle over an existing channel
    pub fn new(sender: mpsc::Sender<ExecutorMessage>) -> Self {
        Self { sender }
    }

    /// Process one intent
    pub async fn submit(&self, group: GroupId, user: UserRef, raw: RawIntent) -> Result<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Submit {
                group,
                user,
                raw,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Redeem a confirmation token
    pub async fn confirm(
        &self,
        group: GroupId,
        user: UserRef,
        token: ConfirmationToken,
    ) -> Result<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Confirm {
                group,
                user,
                token,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Discard a confirmation token
    pub async fn decline(
        &self,
        group: GroupId,
        user: UserRef,
        token: ConfirmationToken,
    ) -> Result<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Decline {
                group,
                user,
                token,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Approve a held big transaction
    pub async fn approve(
        &self,
        group: GroupId,
        admin: UserRef,
        hold_id: HoldId,
    ) -> Result<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Approve {
                group,
                admin,
                hold_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Reject a held big transaction
    pub async fn reject_hold(
        &self,
        group: GroupId,
        admin: UserRef,
        hold_id: HoldId,
    ) -> Result<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::RejectHold {
                group,
                admin,
                hold_id,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// System-wide totals
    pub async fn stats(&self) -> Result<RegistryStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Stats { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Snapshot now
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ExecutorMessage::Flush { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Stop the actor after a final snapshot
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ExecutorMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Load the snapshot, build the executor, and spawn its actor
pub async fn spawn_executor(
    config: Config,
    notifier: Arc<dyn NotificationSink>,
    authorizer: Arc<dyn AuthorizationOracle>,
    config_provider: Arc<dyn GroupConfigProvider>,
    store: Arc<dyn SnapshotBackend>,
) -> Result<ExecutorHandle> {
    let groups = store
        .load()
        .await
        .map_err(|e| Error::Snapshot(e.to_string()))?;
    tracing::info!(groups = groups.len(), "executor starting");

    let registry = LedgerRegistry::from_groups(groups);
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs.max(1));
    let save_interval = Duration::from_secs(config.save_interval_secs.max(1));
    let mailbox_capacity = config.mailbox_capacity.max(1);

    let executor = Executor::new(registry, config, notifier, authorizer, config_provider, store);

    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = ExecutorActor::new(executor, rx, sweep_interval, save_interval);

    tokio::spawn(async move {
        actor.run().await;
    });

    Ok(ExecutorHandle::new(tx))
}
