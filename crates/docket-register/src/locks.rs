//! Per-entry write serialization
//!
//! `update` is a read-modify-write: two unserialized updates of one id can
//! both read version N and both write N+1, losing one. Every mutation holds
//! the id's lock for its whole read-modify-write cycle.

use docket_domain::EntryId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table size above which idle locks are pruned
const PRUNE_THRESHOLD: usize = 1024;

/// Lock table keyed by entry id
#[derive(Debug, Default)]
pub(crate) struct IdLocks {
    table: Mutex<HashMap<EntryId, Arc<AsyncMutex<()>>>>,
}

impl IdLocks {
    /// Wait for exclusive access to `id`
    pub(crate) async fn acquire(&self, id: &EntryId) -> OwnedMutexGuard<()> {
        self.lock_for(id).lock_owned().await
    }

    fn lock_for(&self, id: &EntryId) -> Arc<AsyncMutex<()>> {
        let mut table = self.table.lock();
        if table.len() > PRUNE_THRESHOLD {
            // Only the table holds an idle lock
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        table.entry(id.clone()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().len()
    }
}
