//! Pending-signup ledger: one entry per account still awaiting email
//! verification, keyed by identity id.

#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

use async_trait::async_trait;

use crate::error::StoreError;
pub use repo_types::PendingSignup;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Entries with an id strictly greater than `after`, ordered by id.
    async fn list_page(
        &self,
        after: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PendingSignup>, StoreError>;

    async fn insert(&self, entry: &PendingSignup) -> Result<(), StoreError>;

    /// Removes the entry. Succeeds when it is already absent.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Walks every page and returns the whole ledger in one `Vec`.
    ///
    /// Pagination helper for callers that want a full snapshot, such as
    /// operator tooling. The reaper does not use it: it drives
    /// [`Ledger::list_page`] itself so each page is settled before the next
    /// one is loaded.
    async fn list_all(&self, page_size: i64) -> Result<Vec<PendingSignup>, StoreError> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list_page(cursor.as_deref(), page_size).await?;
            let short = page.len() < usize::try_from(page_size).unwrap_or(usize::MAX);
            cursor = page.last().map(|e| e.id.clone());
            out.extend(page);
            if short || cursor.is_none() {
                return Ok(out);
            }
        }
    }
}
