//! Per-row write locks for inventory items.
//!
//! A lock set is always acquired in ascending medicine id order, so two
//! sales touching overlapping items can never wait on each other in a
//! cycle. Slots are created on demand and removed once nobody holds or
//! waits for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type RowKey = (Uuid, Uuid);
type Slots = HashMap<RowKey, Arc<AsyncMutex<()>>>;

/// The lock table shared by every sale in this process.
#[derive(Clone, Default)]
pub struct RowLocks {
    slots: Arc<Mutex<Slots>>,
}

impl std::fmt::Debug for RowLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowLocks")
            .field("held_or_awaited", &self.len())
            .finish()
    }
}

impl RowLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every `(clinic_id, id)` row, waiting as long as it takes.
    ///
    /// Duplicate ids are locked once. Callers bound the wait with
    /// `tokio::time::timeout`; dropping the future releases whatever was
    /// already acquired.
    pub async fn acquire(&self, clinic_id: Uuid, ids: &[Uuid]) -> RowLockSet {
        let mut ordered = ids.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for id in ordered {
            let slot = self.slot((clinic_id, id));
            let guard = Arc::clone(&slot.mutex).lock_owned().await;
            guards.push(RowLockGuard {
                _guard: guard,
                _slot: slot,
            });
        }

        RowLockSet { guards }
    }

    /// Number of rows currently locked or awaited.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: RowKey) -> SlotRef {
        let mutex = Arc::clone(self.table().entry(key).or_default());
        SlotRef {
            key,
            mutex,
            locks: self.clone(),
        }
    }
}

/// A counted reference to one slot; the last one out removes the slot.
struct SlotRef {
    key: RowKey,
    mutex: Arc<AsyncMutex<()>>,
    locks: RowLocks,
}

impl Drop for SlotRef {
    fn drop(&mut self) {
        let mut table = self.locks.table();
        // One reference lives in the table, the other is ours.
        if Arc::strong_count(&self.mutex) == 2 {
            table.remove(&self.key);
        }
    }
}

struct RowLockGuard {
    // Field order matters: the mutex guard is released before the slot
    // reference checks whether it was the last user.
    _guard: OwnedMutexGuard<()>,
    _slot: SlotRef,
}

/// Every row lock held by one sale. Released on drop.
pub struct RowLockSet {
    guards: Vec<RowLockGuard>,
}

impl RowLockSet {
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn duplicates_are_locked_once() {
        let locks = RowLocks::new();
        let clinic = Uuid::new_v4();
        let a = Uuid::new_v4();

        let set = locks.acquire(clinic, &[a, a, a]).await;
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn held_row_blocks_a_second_sale() {
        let locks = RowLocks::new();
        let clinic = Uuid::new_v4();
        let a = Uuid::new_v4();

        let held = locks.acquire(clinic, &[a]).await;
        assert!(timeout(SHORT, locks.acquire(clinic, &[a])).await.is_err());

        drop(held);
        assert!(timeout(SHORT, locks.acquire(clinic, &[a])).await.is_ok());
    }

    #[tokio::test]
    async fn disjoint_rows_do_not_block() {
        let locks = RowLocks::new();
        let clinic = Uuid::new_v4();

        let _held = locks.acquire(clinic, &[Uuid::new_v4()]).await;
        assert!(
            timeout(SHORT, locks.acquire(clinic, &[Uuid::new_v4()]))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn same_item_id_in_another_clinic_is_a_different_row() {
        let locks = RowLocks::new();
        let a = Uuid::new_v4();

        let _held = locks.acquire(Uuid::new_v4(), &[a]).await;
        assert!(timeout(SHORT, locks.acquire(Uuid::new_v4(), &[a])).await.is_ok());
    }

    #[tokio::test]
    async fn table_is_empty_after_release() {
        let locks = RowLocks::new();
        let clinic = Uuid::new_v4();

        let set = locks
            .acquire(clinic, &[Uuid::new_v4(), Uuid::new_v4()])
            .await;
        assert_eq!(locks.len(), 2);

        drop(set);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn opposite_request_orders_do_not_deadlock() {
        let locks = RowLocks::new();
        let clinic = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut tasks = Vec::new();
        for i in 0..32 {
            let locks = locks.clone();
            let ids = if i % 2 == 0 { vec![a, b] } else { vec![b, a] };
            tasks.push(tokio::spawn(async move {
                let _set = locks.acquire(clinic, &ids).await;
                tokio::task::yield_now().await;
            }));
        }

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        timeout(Duration::from_secs(5), all)
            .await
            .expect("lock ordering must prevent deadlock");
        assert!(locks.is_empty());
    }
}
