//! Search-timeout scheduler.
//!
//! Trip creation arms a durable `search_timeouts` row; this loop fires
//! due rows. The SEARCHING re-check happens at fire time inside the
//! cancel's atomic unit; a trip that was accepted or cancelled in the
//! meantime makes the firing a no-op, never an error.

use crate::db::{repo, Repository};
use crate::error::AppError;
use crate::lifecycle::TripUpdater;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Cancellation reason when the search deadline passes unanswered.
pub const NO_DRIVER_AVAILABLE: &str = "no driver available";

pub struct TimeoutScheduler {
    repo: Arc<Repository>,
    updater: Arc<TripUpdater>,
    poll_interval: Duration,
}

impl TimeoutScheduler {
    pub fn new(repo: Arc<Repository>, updater: Arc<TripUpdater>, poll_interval: Duration) -> Self {
        Self {
            repo,
            updater,
            poll_interval,
        }
    }

    /// Run the sweep loop forever. Spawn this on the runtime.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Search timeout scheduler running (poll every {:?})",
            self.poll_interval
        );

        loop {
            interval.tick().await;
            if let Err(e) = self.fire_due().await {
                warn!("search timeout sweep failed: {}", e);
            }
        }
    }

    /// Fire every due timeout once. Returns how many trips were
    /// actually cancelled (rows whose trip already left SEARCHING are
    /// swept without effect).
    pub async fn fire_due(&self) -> Result<usize, AppError> {
        let now = repo::now_ms();

        let due = {
            let mut conn = self.repo.acquire().await?;
            repo::timeouts::due(&mut conn, now).await?
        };

        let mut fired = 0;
        for (trip_id, requested_by) in due {
            let cancelled = self
                .updater
                .cancel_if_searching(&trip_id, NO_DRIVER_AVAILABLE)
                .await?;

            if cancelled {
                fired += 1;
                info!(
                    "Search timed out for trip {} (requested by {})",
                    trip_id, requested_by
                );
            }

            let mut conn = self.repo.acquire().await?;
            repo::timeouts::clear(&mut conn, &trip_id).await?;
        }

        Ok(fired)
    }
}
