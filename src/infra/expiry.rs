//! Periodic expiry sweep.
//!
//! Proofs past `expires_at` are already treated as expired at verification
//! time; the sweeper just settles the stored status for proofs nobody is
//! verifying, so listings and audits see `expired` without a read.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{ProofStore, ShutdownSignal};
use crate::metrics::{metric_names, MetricsRegistry};

/// Background task that expires overdue proofs on an interval.
pub struct ExpirySweeper {
    store: Arc<dyn ProofStore>,
    metrics: Arc<MetricsRegistry>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<dyn ProofStore>,
        metrics: Arc<MetricsRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            interval,
        }
    }

    /// Run until shutdown is signaled.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.store.expire_overdue(Utc::now()).await {
                        Ok(0) => {}
                        Ok(expired) => {
                            self.metrics
                                .add_counter(metric_names::PROOFS_EXPIRED, expired)
                                .await;
                            info!(expired, "expired overdue proofs");
                        }
                        Err(e) => {
                            self.metrics
                                .inc_counter(metric_names::DATABASE_ERRORS)
                                .await;
                            warn!(error = %e, "expiry sweep failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("expiry sweeper stopping");
                    break;
                }
            }
        }
    }
}
