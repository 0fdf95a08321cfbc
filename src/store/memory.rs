//! In-memory document store.
//!
//! Same contract as the file store without a durable medium. Used in tests
//! and as the reference for alternative backends.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use super::document::{validate_key, DocumentStore};
use super::errors::StoreResult;
use super::lock_table::LockTable;

/// In-memory document store for testing
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
    locks: LockTable,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self, key: &str, default: Value) -> Value {
        self.locks
            .with_lock(key, || self.get(key))
            .unwrap_or(default)
    }

    fn write(&self, key: &str, value: &Value) -> StoreResult<()> {
        validate_key(key)?;
        self.locks.with_lock(key, || self.put(key, value.clone()));
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        default: Value,
        mutate: &mut dyn FnMut(&mut Value) -> bool,
    ) -> StoreResult<bool> {
        validate_key(key)?;
        self.locks.with_lock(key, || {
            let mut value = self.get(key).unwrap_or(default);
            if mutate(&mut value) {
                self.put(key, value);
                Ok(true)
            } else {
                Ok(false)
            }
        })
    }
}
