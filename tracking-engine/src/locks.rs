use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async locks.
///
/// Reconciliation for one business key (scan, compare, delete, insert) runs
/// under its key's lock so concurrent requests for the same key cannot leave
/// it in two buckets. Different keys never contend.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, scope: &str, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(format!("{}/{}", scope, key))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on
    pub fn prune_idle(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyLocks::new());
        let guard = locks.lock("orders", "1001").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("orders", "1001").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_keys_do_not_contend() {
        let locks = KeyLocks::new();
        let _a = locks.lock("orders", "1001").await;
        let _b = locks.lock("orders", "1002").await;
        let _c = locks.lock("subscriptions", "1001").await;
        assert_eq!(locks.len(), 3);
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = KeyLocks::new();
        let held = locks.lock("orders", "1001").await;
        drop(locks.lock("orders", "1002").await);

        locks.prune_idle();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune_idle();
        assert!(locks.is_empty());
    }
}
