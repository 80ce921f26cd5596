use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use super::{repo_types::PendingSignup, Ledger};
use crate::error::StoreError;

/// In-memory ledger with fault injection, used by the unit tests.
#[derive(Default)]
pub struct InMemoryLedger {
    entries: Mutex<BTreeMap<String, PendingSignup>>,
    fail_reads: AtomicBool,
    fail_deletes: Mutex<HashSet<String>>,
    vanish_on_delete: Mutex<HashSet<String>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful delete is appended to `journal` as `ledger:<id>`.
    pub fn with_journal(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    pub fn seed(&self, entry: PendingSignup) {
        self.lock().insert(entry.id.clone(), entry);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.fail_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    /// Deleting `id` removes it but reports `NotFound`, as when an
    /// overlapping run got there first.
    pub fn vanish_on_delete_of(&self, id: &str) {
        self.vanish_on_delete
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string());
    }

    pub fn clear_faults(&self) {
        self.fail_reads(false);
        self.fail_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PendingSignup>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn list_page(
        &self,
        after: Option<&str>,
        limit: i64,
    ) -> Result<Vec<PendingSignup>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("ledger unavailable")));
        }
        let limit = usize::try_from(limit).unwrap_or(0);
        let entries = self.lock();
        let page = entries
            .values()
            .filter(|e| after.map_or(true, |cursor| e.id.as_str() > cursor))
            .take(limit)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn insert(&self, entry: &PendingSignup) -> Result<(), StoreError> {
        let mut entries = self.lock();
        if entries.contains_key(&entry.id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "duplicate pending signup {}",
                entry.id
            )));
        }
        entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        if self
            .fail_deletes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
        {
            return Err(StoreError::Backend(anyhow::anyhow!("ledger delete failed for {}", id)));
        }
        self.lock().remove(id);
        if self
            .vanish_on_delete
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
        {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(format!("ledger:{}", id));
        }
        Ok(())
    }
}
