// Per-loop mutual exclusion for recompute cascades
use crate::domain::process_loop::LoopId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per process loop. A mutation holds its loop's guard
/// until the whole identification, tuning and aggregation cascade has
/// been persisted. Different loops never contend.
#[derive(Default)]
pub struct LoopLocks {
    locks: Mutex<HashMap<LoopId, Arc<AsyncMutex<()>>>>,
}

impl LoopLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, loop_id: LoopId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(loop_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted loop.
    pub fn forget(&self, loop_id: LoopId) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(&loop_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_loop_is_serialized() {
        let locks = Arc::new(LoopLocks::new());
        let guard = locks.acquire(1).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_loops_do_not_contend() {
        let locks = LoopLocks::new();
        let _first = locks.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(second.is_ok());
    }
}
