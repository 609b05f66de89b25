//! Per-entry mutual exclusion.

use parking_lot::Mutex;
use sealfs_types::EntryId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// Registry of per-entry exclusive locks.
///
/// Two concurrent sync attempts on the same entry must not interleave their
/// read-merge-write sequences on the local cache; the guard is held across
/// those steps and released on drop on every exit path.
#[derive(Debug, Default)]
pub struct EntryLocks {
    locks: Mutex<HashMap<EntryId, Arc<tokio::sync::Mutex<()>>>>,
}

impl EntryLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the exclusive lock for an entry, waiting if it is held.
    pub async fn acquire(&self, id: EntryId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn same_entry_is_serialized() {
        let locks = Arc::new(EntryLocks::new());
        let id = EntryId::generate();
        let active = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_entries_do_not_block() {
        let locks = EntryLocks::new();
        let _a = locks.acquire(EntryId::generate()).await;
        // A second entry's lock must be immediately available.
        let _b = locks.acquire(EntryId::generate()).await;
    }
}
