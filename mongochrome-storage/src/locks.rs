//! Per-key write serialization.
//!
//! A write to a root key reads the stored record, merges, and saves it back
//! across await points. Two writers to the same key can interleave there and
//! lose an update. When enabled, `KeyLocks` hands out one async mutex per
//! (collection, root key) that a writer holds for its whole read-modify-write.
//!
//! Independently of that switch, every write holds its collection's gate in
//! shared mode, and dropping a collection takes the gate exclusively. A drop
//! therefore never interleaves with a write to any key of the collection.
//! Lock order: collection gate first, then key lock. The exclusive gate is
//! only taken with no key lock held.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{
    Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};

/// Registry of per-(collection, root key) write locks.
#[derive(Debug, Default)]
pub struct KeyLocks {
    enabled: bool,
    locks: DashMap<(String, String), Arc<Mutex<()>>>,
    gates: DashMap<String, Arc<RwLock<()>>>,
}

impl KeyLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
            gates: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait for the lock on (collection, root key).
    ///
    /// Returns `None` immediately when locking is disabled.
    pub async fn acquire(&self, collection: &str, root_key: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = self
            .locks
            .entry((collection.to_string(), root_key.to_string()))
            .or_default()
            .clone();
        Some(lock.lock_owned().await)
    }

    /// Enter a collection as one of possibly many concurrent writers.
    pub async fn share_collection(&self, collection: &str) -> OwnedRwLockReadGuard<()> {
        self.gate(collection).read_owned().await
    }

    /// Wait until no writer is inside the collection and keep others out.
    pub async fn lock_collection(&self, collection: &str) -> OwnedRwLockWriteGuard<()> {
        self.gate(collection).write_owned().await
    }

    fn gate(&self, collection: &str) -> Arc<RwLock<()>> {
        self.gates
            .entry(collection.to_string())
            .or_default()
            .clone()
    }

    /// Number of keys that have been locked at least once.
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }
}
