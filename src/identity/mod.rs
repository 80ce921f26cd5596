//! Identity store: account records carrying the email verification flag.

#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

use async_trait::async_trait;

use crate::error::StoreError;
pub use repo_types::Identity;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks up an identity. `Ok(None)` when it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError>;

    /// Provisions a new, unverified identity.
    async fn create(&self, id: &str, email: &str) -> Result<Identity, StoreError>;

    /// Marks the identity's email as confirmed.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no identity has this id.
    async fn set_verified(&self, id: &str) -> Result<Identity, StoreError>;

    /// Removes the identity. Succeeds when it is already absent.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
