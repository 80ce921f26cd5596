use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{repo_types::Identity, IdentityStore};
use crate::error::StoreError;

/// In-memory identity store with fault injection, used by the unit tests.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: Mutex<HashMap<String, Identity>>,
    fail_gets: Mutex<HashSet<String>>,
    fail_deletes: Mutex<HashSet<String>>,
    vanish_on_delete: Mutex<HashSet<String>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful delete is appended to `journal` as `identity:<id>`.
    pub fn with_journal(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    pub fn seed(&self, id: &str, email: &str, verified: bool) {
        self.lock().insert(
            id.to_string(),
            Identity {
                id: id.to_string(),
                email: email.to_string(),
                verified,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        );
    }

    pub fn snapshot(&self, id: &str) -> Option<Identity> {
        self.lock().get(id).cloned()
    }

    pub fn fail_get_of(&self, id: &str) {
        self.fail_gets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    /// Deleting `id` removes it but reports `NotFound`, as when another
    /// process got there first.
    pub fn vanish_on_delete_of(&self, id: &str) {
        self.vanish_on_delete
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Identity>> {
        self.identities.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn should_fail(set: &Mutex<HashSet<String>>, id: &str) -> bool {
        set.lock().unwrap_or_else(|e| e.into_inner()).contains(id)
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get(&self, id: &str) -> Result<Option<Identity>, StoreError> {
        if Self::should_fail(&self.fail_gets, id) {
            return Err(StoreError::Backend(anyhow::anyhow!("identity service timed out")));
        }
        Ok(self.lock().get(id).cloned())
    }

    async fn create(&self, id: &str, email: &str) -> Result<Identity, StoreError> {
        let mut identities = self.lock();
        if identities.contains_key(id) {
            return Err(StoreError::Backend(anyhow::anyhow!("identity {} already exists", id)));
        }
        let identity = Identity {
            id: id.to_string(),
            email: email.to_string(),
            verified: false,
            created_at: OffsetDateTime::now_utc(),
        };
        identities.insert(id.to_string(), identity.clone());
        Ok(identity)
    }

    async fn set_verified(&self, id: &str) -> Result<Identity, StoreError> {
        let mut identities = self.lock();
        let identity = identities
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        identity.verified = true;
        Ok(identity.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if Self::should_fail(&self.fail_deletes, id) {
            return Err(StoreError::Backend(anyhow::anyhow!("identity delete failed for {}", id)));
        }
        self.lock().remove(id);
        if Self::should_fail(&self.vanish_on_delete, id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(format!("identity:{}", id));
        }
        Ok(())
    }
}
