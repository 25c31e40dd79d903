// ── Change Engine: per-itinerary exclusive section ─────────────────────────
// Generalizes the teacher's `PendingApprovals` pattern (a
// `Mutex<HashMap<key, async primitive>>` registry, one entry per pending
// tool call) to "one async write lock per itinerary" (spec.md §5).
//
// AI calls must never happen while a guard from here is held — an agent
// computes its ChangeSet unlocked, then re-enters `apply` for the short
// locked critical section.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct LockTable {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LockTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn entry(&self, itinerary_id: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(itinerary_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquire the exclusive section for `itinerary_id`. The returned guard
    /// must be held for load → compute → save → appendRevision → publish
    /// and dropped immediately after.
    pub(crate) async fn acquire(&self, itinerary_id: &str) -> OwnedMutexGuard<()> {
        self.entry(itinerary_id).lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_access_to_the_same_itinerary() {
        let table = Arc::new(LockTable::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let t1 = {
            let table = table.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _guard = table.acquire("trip-1").await;
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                order.lock().push(1);
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let t2 = {
            let table = table.clone();
            let order = order.clone();
            tokio::spawn(async move {
                let _guard = table.acquire("trip-1").await;
                order.lock().push(2);
            })
        };

        t1.await.unwrap();
        t2.await.unwrap();
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn different_itineraries_do_not_contend() {
        let table = LockTable::new();
        let g1 = table.acquire("trip-1").await;
        let g2 = table.acquire("trip-2").await;
        drop(g1);
        drop(g2);
    }
}
