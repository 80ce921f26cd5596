use std::time::Duration;

use thiserror::Error;

/// Errors raised by the ledger, identity and lease backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row".into()),
            other => StoreError::Backend(anyhow::Error::new(other)),
        }
    }
}

/// Failures that abort a whole reaper run.
#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("failed to read pending signups: {0}")]
    Ledger(#[source] StoreError),
    #[error("failed to manage run lease: {0}")]
    Lease(#[source] StoreError),
    #[error("run did not finish within {0:?}")]
    Timeout(Duration),
}
