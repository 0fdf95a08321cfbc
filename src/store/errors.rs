//! # Store Errors
//!
//! Error types for the document store.
//!
//! Reads never produce errors: a missing or corrupt document degrades to the
//! caller's default. Only writes and key validation can fail.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Key contains characters that cannot name a document
    #[error("Invalid document key: {0:?}")]
    InvalidKey(String),

    /// Value could not be serialized to JSON
    #[error("Failed to serialize document {key}: {message}")]
    Serialization { key: String, message: String },

    /// Underlying medium rejected the write; the mutation was not applied
    #[error("Storage unavailable for document {key}: {message}")]
    StorageUnavailable { key: String, message: String },
}

impl StoreError {
    pub(crate) fn unavailable(key: &str, message: impl Into<String>) -> Self {
        StoreError::StorageUnavailable {
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidKey(_) => 400,
            StoreError::Serialization { .. } => 500,
            StoreError::StorageUnavailable { .. } => 500,
        }
    }
}
