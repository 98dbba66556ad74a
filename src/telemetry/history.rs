//! Per-target append-only snapshot history, protected by a single
//! reader-writer lock (§4.1 "Storage discipline"). Writers are the
//! collection timer only; readers return cheap `Arc` clones, never
//! mutate in place.

use crate::types::{MetricsSnapshot, Target};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct HistoryStore {
    inner: RwLock<HashMap<Target, VecDeque<Arc<MetricsSnapshot>>>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheap read of the most recent snapshot for a target.
    pub async fn latest(&self, target: &Target) -> Option<Arc<MetricsSnapshot>> {
        let guard = self.inner.read().await;
        guard.get(target).and_then(|seq| seq.back().cloned())
    }

    /// Ordered snapshots within retention for a target.
    pub async fn history(&self, target: &Target) -> Vec<Arc<MetricsSnapshot>> {
        let guard = self.inner.read().await;
        guard
            .get(target)
            .map(|seq| seq.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append a snapshot. Sequences are totally ordered per target
    /// because the aggregator's collection loop is the sole writer and
    /// processes one cycle to completion before the next begins.
    pub async fn append(&self, snapshot: MetricsSnapshot) {
        let mut guard = self.inner.write().await;
        guard
            .entry(snapshot.target.clone())
            .or_default()
            .push_back(Arc::new(snapshot));
    }

    /// Evict snapshots older than `now - retention` across every target.
    pub async fn evict_older_than(&self, now: SystemTime, retention: Duration) {
        let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);
        let mut guard = self.inner.write().await;
        for seq in guard.values_mut() {
            while seq.front().is_some_and(|s| s.timestamp < cutoff) {
                seq.pop_front();
            }
        }
        guard.retain(|_, seq| !seq.is_empty());
    }
}
