use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::{repo_types::Identity, IdentityStore};
use crate::error::StoreError;

/// Identity store backed by the `identities` table.
#[derive(Clone)]
pub struct PgIdentityStore {
    db: PgPool,
}

impl PgIdentityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            SELECT id, email, email_verified AS verified, created_at
              FROM identities
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("get identity {}", id))?;
        Ok(identity)
    }

    async fn create(&self, id: &str, email: &str) -> Result<Identity, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities (id, email)
            VALUES ($1, $2)
            RETURNING id, email, email_verified AS verified, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(&self.db)
        .await
        .with_context(|| format!("create identity {}", id))?;
        Ok(identity)
    }

    async fn set_verified(&self, id: &str) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(
            r#"
            UPDATE identities
               SET email_verified = TRUE
             WHERE id = $1
            RETURNING id, email, email_verified AS verified, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .with_context(|| format!("verify identity {}", id))?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM identities WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete identity {}", id))?;
        Ok(())
    }
}
