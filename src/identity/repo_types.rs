use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Account record owned by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub verified: bool, // flipped by the confirmation link flow
    pub created_at: OffsetDateTime,
}
