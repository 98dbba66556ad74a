//! Keyed reconcile queue: at most one in-flight reconcile per target,
//! distinct targets run in parallel (§5).

use crate::types::Target;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ReconcileQueue {
    locks: DashMap<Target, Arc<Mutex<()>>>,
}

impl ReconcileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the serialization lock for `target`, blocking until any
    /// in-flight reconcile for the same target has finished. The
    /// returned guard releases the lock on drop.
    pub async fn acquire(&self, target: Target) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(target)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
