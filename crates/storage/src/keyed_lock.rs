//! Per-key async mutex registry.
//!
//! Guards the stamp critical section per batch. The registry lives as long
//! as the process; entries are created on first use and kept, since the
//! set of keys is bounded by the set of batches a node stamps with.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct KeyedMutex {
    locks: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedMutex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the mutex for `key`, creating it on first use. The guard is
    /// owned and may be held across await points.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
