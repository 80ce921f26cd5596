use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::StoreError;

/// Named, expiring lock that keeps two reaper processes from running at once.
#[async_trait]
pub trait RunLease: Send + Sync {
    /// Takes the lease if it is free, expired, or already ours.
    /// Returns `false` when another holder owns it.
    async fn try_acquire(
        &self,
        name: &str,
        holder: Uuid,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    async fn release(&self, name: &str, holder: Uuid) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgRunLease {
    db: PgPool,
}

impl PgRunLease {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RunLease for PgRunLease {
    async fn try_acquire(
        &self,
        name: &str,
        holder: Uuid,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO reaper_leases (name, holder, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
               SET holder = EXCLUDED.holder,
                   expires_at = EXCLUDED.expires_at
             WHERE reaper_leases.expires_at <= $4
                OR reaper_leases.holder = EXCLUDED.holder
            RETURNING holder
            "#,
        )
        .bind(name)
        .bind(holder)
        .bind(now + ttl)
        .bind(now)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("acquire lease {}", name))?;
        Ok(row.is_some())
    }

    async fn release(&self, name: &str, holder: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM reaper_leases WHERE name = $1 AND holder = $2"#)
            .bind(name)
            .bind(holder)
            .execute(&self.db)
            .await
            .with_context(|| format!("release lease {}", name))?;
        Ok(())
    }
}
