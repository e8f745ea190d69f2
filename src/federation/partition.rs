use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

static PROCESS_LOCKS: Lazy<PartitionLocks> = Lazy::new(PartitionLocks::new);

/// One lock per remote day-partition.
///
/// Upload and download runs for the same date hold the same lock, so they
/// never overlap within the process. Runs for different dates proceed
/// independently.
#[derive(Clone, Default)]
pub struct PartitionLocks {
    locks: Arc<RwLock<HashMap<NaiveDate, Arc<Mutex<()>>>>>,
}

impl PartitionLocks {
    /// Independent lock set, for callers that scope serialization themselves
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock set every engine in the process uses unless given another
    pub fn process() -> Self {
        PROCESS_LOCKS.clone()
    }

    /// Wait for and take the lock of `date`
    pub async fn lock(&self, date: NaiveDate) -> OwnedMutexGuard<()> {
        self.get_or_create(date).await.lock_owned().await
    }

    /// Take the lock of `date` only if no run holds it
    pub async fn try_lock(&self, date: NaiveDate) -> Option<OwnedMutexGuard<()>> {
        self.get_or_create(date).await.try_lock_owned().ok()
    }

    async fn get_or_create(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&date) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().await;
        // Entries nobody holds or waits on are only referenced by the map
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(date).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    async fn tracked(locks: &PartitionLocks) -> Vec<NaiveDate> {
        let mut dates: Vec<_> = locks.locks.read().await.keys().copied().collect();
        dates.sort();
        dates
    }

    #[tokio::test]
    async fn test_same_date_is_exclusive() {
        let locks = PartitionLocks::new();
        let _held = locks.lock(day(18)).await;

        assert!(locks.try_lock(day(18)).await.is_none());
    }

    #[tokio::test]
    async fn test_different_dates_are_independent() {
        let locks = PartitionLocks::new();
        let _held = locks.lock(day(18)).await;

        assert!(locks.try_lock(day(17)).await.is_some());
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = PartitionLocks::new();
        drop(locks.lock(day(18)).await);

        assert!(locks.try_lock(day(18)).await.is_some());
    }

    #[tokio::test]
    async fn test_released_dates_are_pruned() {
        let locks = PartitionLocks::new();
        for d in 1..=5 {
            drop(locks.lock(day(d)).await);
        }
        let _held = locks.lock(day(10)).await;
        drop(locks.lock(day(11)).await);

        // Only the held date and the one just inserted remain
        assert_eq!(tracked(&locks).await, vec![day(10), day(11)]);
    }

    #[tokio::test]
    async fn test_held_lock_survives_pruning() {
        let locks = PartitionLocks::new();
        let _held = locks.lock(day(18)).await;
        drop(locks.lock(day(19)).await);

        assert!(locks.try_lock(day(18)).await.is_none());
    }

    #[tokio::test]
    async fn test_process_locks_are_shared() {
        let _held = PartitionLocks::process().lock(day(2)).await;
        assert!(PartitionLocks::process().try_lock(day(2)).await.is_none());
    }
}
