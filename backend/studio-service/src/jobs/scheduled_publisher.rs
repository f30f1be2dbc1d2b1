//! Scheduled publisher background job.
//!
//! Polls for scheduled content whose time has come, claims it, and runs the
//! same dispatch path as publish-now. Claiming (`claimed_at` set under
//! `FOR UPDATE SKIP LOCKED`) keeps two service replicas from double-publishing
//! an item. A crash between claim and outcome leaves the row claimed for
//! operator inspection; duplicate posts are worse than a stuck row, so the
//! job never re-dispatches a claimed item.

use crate::db::content_repo;
use crate::metrics;
use crate::services::ContentService;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

/// Delay before the first poll so startup probes settle first.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

pub struct ScheduledPublisherJob {
    pool: PgPool,
    content: Arc<ContentService>,
    poll_interval: Duration,
    batch_size: i64,
}

impl ScheduledPublisherJob {
    pub fn new(
        pool: PgPool,
        content: Arc<ContentService>,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            pool,
            content,
            poll_interval,
            batch_size,
        }
    }

    /// Run the poll loop until the shutdown channel fires. A cycle in flight
    /// finishes before the loop exits, so claimed items get their outcome.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + STARTUP_DELAY, self.poll_interval);
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            batch_size = self.batch_size,
            "Scheduled publisher started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        metrics::record_scheduler_poll("error");
                        error!("Scheduled publish cycle failed: {}", err);
                    }
                }
                _ = shutdown.recv() => {
                    info!("Scheduled publisher stopping");
                    break;
                }
            }
        }
    }

    /// Claim due items and dispatch each one. Per-item failures are recorded
    /// on the item itself; only claiming is fatal for the cycle.
    async fn poll_once(&self) -> Result<(), sqlx::Error> {
        let due = content_repo::claim_due_scheduled(&self.pool, self.batch_size).await?;

        if due.is_empty() {
            metrics::record_scheduler_poll("empty");
            debug!("No scheduled content due");
            return Ok(());
        }

        info!(claimed = due.len(), "Dispatching scheduled content");

        for item in &due {
            match self.content.dispatch_claimed(item).await {
                Ok(status) => {
                    debug!(
                        content_id = %item.id,
                        status = status.as_str(),
                        "Scheduled item dispatched"
                    );
                }
                Err(err) => {
                    // The item keeps its claim; the outcome row explains why.
                    warn!(content_id = %item.id, "Scheduled dispatch failed: {}", err);
                }
            }
        }

        metrics::record_scheduler_poll("dispatched");
        Ok(())
    }
}
