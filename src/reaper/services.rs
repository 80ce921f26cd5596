use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::summary::{RecordOutcome, RecordResult, Resolution, RunSummary, SkipReason};
use crate::{
    clock::Clock,
    config::ReaperConfig,
    error::{ReaperError, StoreError},
    identity::IdentityStore,
    ledger::{Ledger, PendingSignup},
    state::AppState,
};

/// Deletes identities that never confirmed their email within the grace period.
#[derive(Clone)]
pub struct Reaper {
    ledger: Arc<dyn Ledger>,
    identities: Arc<dyn IdentityStore>,
    clock: Arc<dyn Clock>,
    grace: time::Duration,
    page_size: i64,
    concurrency: usize,
    run_timeout: Duration,
    clean_orphans: bool,
}

impl Reaper {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        identities: Arc<dyn IdentityStore>,
        clock: Arc<dyn Clock>,
        config: &ReaperConfig,
    ) -> Self {
        Self {
            ledger,
            identities,
            clock,
            grace: config.grace_period(),
            page_size: config.page_size,
            concurrency: config.concurrency.max(1),
            run_timeout: config.run_timeout(),
            clean_orphans: config.clean_orphans,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.ledger.clone(),
            state.identities.clone(),
            state.clock.clone(),
            &state.config.reaper,
        )
    }

    #[cfg(test)]
    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// One bounded pass. A timeout fails the run; entries not yet settled
    /// remain in the ledger for the next run.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, ReaperError> {
        tokio::time::timeout(self.run_timeout, self.run_once(cancel))
            .await
            .map_err(|_| ReaperError::Timeout(self.run_timeout))?
    }

    /// Walks the whole ledger once, settling every entry past its grace period.
    ///
    /// Only a failure to read the ledger aborts the run. Per-entry failures
    /// are recorded in the summary and the entry is kept.
    #[instrument(name = "reaper.run", skip_all, fields(run_id = %Uuid::new_v4()))]
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<RunSummary, ReaperError> {
        let now = self.clock.now();
        let mut summary = RunSummary::new(now);
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut cursor: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                warn!("shutdown requested, stopping run early");
                summary.cancelled = true;
                break;
            }

            let page = self
                .ledger
                .list_page(cursor.as_deref(), self.page_size)
                .await
                .map_err(ReaperError::Ledger)?;
            let short = page.len() < usize::try_from(self.page_size).unwrap_or(usize::MAX);
            cursor = page.last().map(|e| e.id.clone());
            debug!(count = page.len(), "fetched pending signups page");

            let mut tasks = JoinSet::new();
            for entry in page {
                let ledger = self.ledger.clone();
                let identities = self.identities.clone();
                let permits = permits.clone();
                let grace = self.grace;
                let clean_orphans = self.clean_orphans;
                tasks.spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    resolve(ledger.as_ref(), identities.as_ref(), entry, now, grace, clean_orphans)
                        .await
                });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => summary.push(result),
                    Err(e) => {
                        error!(error = %e, "pending signup task aborted");
                        summary.aborted_tasks += 1;
                    }
                }
            }

            if short || cursor.is_none() {
                break;
            }
        }

        info!(
            total = summary.results.len(),
            reclaimed = summary.count_resolved(Resolution::Reclaimed),
            confirmed_cleaned = summary.count_resolved(Resolution::ConfirmedCleaned),
            orphan_cleaned = summary.count_resolved(Resolution::OrphanCleaned),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "reaper run finished"
        );
        Ok(summary)
    }
}

async fn resolve(
    ledger: &dyn Ledger,
    identities: &dyn IdentityStore,
    entry: PendingSignup,
    now: OffsetDateTime,
    grace: time::Duration,
    clean_orphans: bool,
) -> RecordResult {
    let outcome = match entry.age(now) {
        None => {
            warn!(user_id = %entry.id, "pending signup has no created_at, skipping");
            RecordOutcome::Skipped(SkipReason::MissingCreatedAt)
        }
        Some(age) if age < grace => RecordOutcome::Skipped(SkipReason::GracePeriod),
        Some(_) => match settle(ledger, identities, &entry.id, clean_orphans).await {
            Ok(resolution) => {
                match resolution {
                    Resolution::Reclaimed => {
                        info!(user_id = %entry.id, email = %entry.email, "deleted unverified user")
                    }
                    Resolution::ConfirmedCleaned => {
                        info!(user_id = %entry.id, email = %entry.email, "verified user cleaned up")
                    }
                    Resolution::OrphanCleaned => {
                        info!(user_id = %entry.id, email = %entry.email, "identity already gone, cleaned up")
                    }
                }
                RecordOutcome::Resolved(resolution)
            }
            Err(e) => {
                warn!(user_id = %entry.id, error = %e, "failed to resolve pending signup");
                RecordOutcome::Failed(e.to_string())
            }
        },
    };
    RecordResult {
        id: entry.id,
        email: entry.email,
        outcome,
    }
}

/// A missing identity is a failure that keeps the entry, unless
/// `clean_orphans` is set.
async fn settle(
    ledger: &dyn Ledger,
    identities: &dyn IdentityStore,
    id: &str,
    clean_orphans: bool,
) -> Result<Resolution, StoreError> {
    let resolution = match identities.get(id).await? {
        Some(identity) if identity.verified => Resolution::ConfirmedCleaned,
        Some(_) => {
            absent_ok(identities.delete(id).await)?;
            Resolution::Reclaimed
        }
        None if clean_orphans => Resolution::OrphanCleaned,
        None => return Err(StoreError::NotFound(format!("identity {}", id))),
    };
    // Ledger entry goes last so a failure above leaves it for the next run.
    absent_ok(ledger.delete(id).await)?;
    Ok(resolution)
}

fn absent_ok(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::NotFound(_)) => Ok(()),
        other => other,
    }
}
