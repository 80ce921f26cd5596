use std::{sync::Arc, time::Duration};

use time::Duration as TimeDuration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{lease::RunLease, services::Reaper, summary::RunSummary};
use crate::{
    clock::Clock,
    config::MAX_RUN_TIMEOUT_SECS,
    error::ReaperError,
    state::AppState,
};

pub const LEASE_NAME: &str = "unverified-accounts";

/// Lease lifetime for a run bounded by `run_timeout`, capped at the largest
/// accepted run timeout.
fn lease_ttl(run_timeout: Duration) -> TimeDuration {
    let secs = run_timeout.as_secs().min(MAX_RUN_TIMEOUT_SECS);
    TimeDuration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// Fires the reaper on a fixed interval, one run at a time.
pub struct Scheduler {
    reaper: Reaper,
    lease: Arc<dyn RunLease>,
    clock: Arc<dyn Clock>,
    holder: Uuid,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        reaper: Reaper,
        lease: Arc<dyn RunLease>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            reaper,
            lease,
            clock,
            holder: Uuid::new_v4(),
            interval,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Reaper::from_state(state),
            state.lease.clone(),
            state.clock.clone(),
            state.config.reaper.interval(),
        )
    }

    /// Runs once if the lease is free. `Ok(None)` means another process
    /// holds it and this tick was skipped.
    pub async fn tick(&self, cancel: &CancellationToken) -> Result<Option<RunSummary>, ReaperError> {
        let ttl = lease_ttl(self.reaper.run_timeout());
        let acquired = self
            .lease
            .try_acquire(LEASE_NAME, self.holder, self.clock.now(), ttl)
            .await
            .map_err(ReaperError::Lease)?;
        if !acquired {
            info!(holder = %self.holder, "reaper lease held elsewhere, skipping run");
            return Ok(None);
        }

        let result = self.reaper.run(cancel).await;

        if let Err(e) = self.lease.release(LEASE_NAME, self.holder).await {
            // It expires on its own after the run timeout.
            warn!(error = %e, "failed to release reaper lease");
        }
        result.map(Some)
    }

    /// Loops until `cancel` fires. The first run starts immediately; ticks
    /// missed while a run is in flight are dropped, not queued.
    pub async fn run_forever(&self, cancel: CancellationToken) {
        info!(
            holder = %self.holder,
            interval_secs = self.interval.as_secs(),
            "reaper scheduler started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if let Err(e) = self.tick(&cancel).await {
                error!(error = %e, "reaper run failed, retrying on next schedule");
            }
        }
        info!("reaper scheduler stopped");
    }
}
