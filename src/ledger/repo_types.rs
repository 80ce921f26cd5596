use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime};

/// Bookkeeping row for an account that still has to confirm its email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PendingSignup {
    pub id: String,                         // identity id, same key as the identity record
    pub email: String,                      // address the account must verify
    pub created_at: Option<OffsetDateTime>, // stamped at signup, NULL on legacy rows
}

impl PendingSignup {
    /// Time elapsed since signup, or `None` when the row was never stamped.
    pub fn age(&self, now: OffsetDateTime) -> Option<Duration> {
        self.created_at.map(|created_at| now - created_at)
    }
}
