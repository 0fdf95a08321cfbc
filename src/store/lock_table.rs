//! Per-key lock registry.
//!
//! Each document key gets its own mutex. The table itself is guarded by a
//! reader/writer lock: existing keys are looked up under the read lock, new
//! keys are inserted under the write lock after a second check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Registry of per-key mutexes owned by a single store instance.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or lazily create) the mutex for `key`.
    pub fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(lock) = locks.get(key) {
                return Arc::clone(lock);
            }
        }

        let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The key mutexes guard no data, so a poisoned lock (a panic inside a
    /// previous critical section) is simply taken over.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(key);
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of keys that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
