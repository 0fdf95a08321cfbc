//! # Document Store Contract
//!
//! A document is one whole named JSON collection persisted as a unit.
//! The store knows nothing about document shapes beyond "valid JSON";
//! shapes live in the typed [`Document`] layer on top.
//!
//! ## Invariants
//! - Reads never fail: missing or corrupt documents degrade to the default
//! - Writes are all-or-nothing: a reader sees the old or the new value
//! - All operations on one key are serialized; distinct keys do not block

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use super::errors::{StoreError, StoreResult};

/// Keyed JSON document persistence.
///
/// Implementations must serialize `read`, `write` and `update` per key.
pub trait DocumentStore: Send + Sync {
    /// Returns the last committed value for `key`, or `default` if the
    /// document has never been written or cannot be decoded.
    fn read(&self, key: &str, default: Value) -> Value;

    /// Replaces the document for `key`. On error the previously committed
    /// document is untouched and the caller must treat the mutation as not
    /// applied.
    fn write(&self, key: &str, value: &Value) -> StoreResult<()>;

    /// Read-modify-write inside one critical section on `key`.
    ///
    /// `mutate` receives the current value (or `default`) and returns
    /// whether the modified value should be persisted. Returns `Ok(true)`
    /// when a write was committed, `Ok(false)` when `mutate` declined.
    fn update(
        &self,
        key: &str,
        default: Value,
        mutate: &mut dyn FnMut(&mut Value) -> bool,
    ) -> StoreResult<bool>;
}

/// Checks that `key` can name a document.
///
/// Keys map directly onto file names, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// A typed document kind stored under a fixed key.
pub trait Document: Serialize + DeserializeOwned + Default {
    /// Store key of this document kind
    const KEY: &'static str;

    /// JSON form of the empty document
    fn empty() -> Value {
        serde_json::to_value(Self::default()).unwrap_or(Value::Null)
    }

    /// Strict decode of a raw value.
    fn try_decode(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    /// Decode a raw value, degrading to the empty document on shape drift.
    fn decode(value: Value) -> Self {
        match Self::try_decode(&value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = Self::KEY, error = %e, "document shape mismatch, reset to default");
                Self::default()
            }
        }
    }
}

/// Outcome of a typed read-modify-write closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    /// Persist the modified document and return the value
    Commit(T),
    /// Leave the document untouched and return the value
    Abort(T),
}

/// Load a typed document.
pub fn load<D: Document>(store: &dyn DocumentStore) -> D {
    D::decode(store.read(D::KEY, D::empty()))
}

/// Typed read-modify-write.
///
/// `f` runs while the document's key lock is held. Returning
/// `Ok(Mutation::Commit(_))` persists the document; `Ok(Mutation::Abort(_))`
/// and `Err(_)` leave it untouched. A failed write is returned as `E` and
/// the value produced by `f` is discarded.
///
/// A stored document that is valid JSON but does not decode as `D` is never
/// overwritten: `f` is not called and `StoreError::Serialization` is
/// returned.
pub fn modify<D, T, E, F>(store: &dyn DocumentStore, f: F) -> Result<T, E>
where
    D: Document,
    E: From<StoreError>,
    F: FnOnce(&mut D) -> Result<Mutation<T>, E>,
{
    let mut f = Some(f);
    let mut outcome: Option<Result<T, E>> = None;
    let mut write_error: Option<StoreError> = None;

    store
        .update(D::KEY, D::empty(), &mut |value| {
            let Some(f) = f.take() else {
                return false;
            };
            let mut doc = match D::try_decode(value) {
                Ok(doc) => doc,
                Err(e) => {
                    error!(key = D::KEY, error = %e, "document shape mismatch, refusing to overwrite");
                    write_error = Some(StoreError::Serialization {
                        key: D::KEY.to_string(),
                        message: format!("stored document does not match its shape: {}", e),
                    });
                    return false;
                }
            };
            match f(&mut doc) {
                Ok(Mutation::Commit(result)) => match serde_json::to_value(&doc) {
                    Ok(encoded) => {
                        *value = encoded;
                        outcome = Some(Ok(result));
                        true
                    }
                    Err(e) => {
                        write_error = Some(StoreError::Serialization {
                            key: D::KEY.to_string(),
                            message: e.to_string(),
                        });
                        false
                    }
                },
                Ok(Mutation::Abort(result)) => {
                    outcome = Some(Ok(result));
                    false
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        })
        .map_err(E::from)?;

    if let Some(e) = write_error {
        return Err(E::from(e));
    }
    outcome.unwrap_or_else(|| {
        Err(E::from(StoreError::unavailable(
            D::KEY,
            "update closure was not invoked",
        )))
    })
}
