//! Keyed reader/writer locks.
//!
//! Each key gets its own `tokio::sync::RwLock<()>`, created on first use. Guards are
//! owned so they can be held across awaits and stored side by side. Entries nobody
//! holds are dropped once the table grows past `prune_threshold`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

const DEFAULT_PRUNE_THRESHOLD: usize = 10_000;

pub struct LockTable<K> {
    locks: Mutex<HashMap<K, Arc<RwLock<()>>>>,
    prune_threshold: usize,
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Ord + Clone,
{
    fn default() -> Self {
        Self::with_prune_threshold(DEFAULT_PRUNE_THRESHOLD)
    }
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Ord + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prune_threshold(prune_threshold: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            prune_threshold,
        }
    }

    async fn handle(&self, key: &K) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().await;
        if locks.len() >= self.prune_threshold {
            // Only the table holds a reference: no guard or waiter exists.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(key.clone()).or_default().clone()
    }

    /// Exclusive access to `key`.
    pub async fn write(&self, key: &K) -> OwnedRwLockWriteGuard<()> {
        self.handle(key).await.write_owned().await
    }

    /// Shared access to `key`.
    pub async fn read(&self, key: &K) -> OwnedRwLockReadGuard<()> {
        self.handle(key).await.read_owned().await
    }

    /// Exclusive access to every key, acquired in ascending key order so that two
    /// callers locking overlapping sets can never wait on each other in a cycle.
    pub async fn write_all(&self, keys: &[K]) -> Vec<OwnedRwLockWriteGuard<()>> {
        let mut ordered = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            guards.push(self.write(key).await);
        }
        guards
    }

    /// Number of keys currently tracked.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
