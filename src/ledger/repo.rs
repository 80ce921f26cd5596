use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{repo_types::PendingSignup, Ledger};
use crate::error::StoreError;

/// Ledger backed by the `pending_verifications` table.
#[derive(Clone)]
pub struct PgLedger {
    db: PgPool,
}

impl PgLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn list_page(
        &self,
        after: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PendingSignup>, StoreError> {
        let rows = sqlx::query_as::<_, PendingSignup>(
            r#"
            SELECT id, email, created_at
              FROM pending_verifications
             WHERE ($1::TEXT IS NULL OR id > $1)
             ORDER BY id ASC
             LIMIT $2
            "#,
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list pending verifications")?;
        Ok(rows)
    }

    async fn insert(&self, entry: &PendingSignup) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO pending_verifications (id, email, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.email)
        .bind(entry.created_at)
        .execute(&self.db)
        .await
        .context("insert pending verification")?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        // Zero affected rows is fine, the entry is already gone.
        sqlx::query(r#"DELETE FROM pending_verifications WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete pending verification {}", id))?;
        Ok(())
    }
}
