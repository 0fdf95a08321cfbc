//! # Document Store
//!
//! Keyed JSON document persistence with per-key mutual exclusion and
//! crash-safe atomic writes.
//!
//! - [`DocumentStore`]: the backend contract (read / write / update)
//! - [`FileDocumentStore`]: one JSON file per key, temp file + atomic rename
//! - [`MemoryDocumentStore`]: in-process backend with the same contract
//! - [`Document`], [`load`], [`modify`]: typed access on top of any backend

pub mod errors;
pub mod document;
pub mod file;
pub mod lock_table;
pub mod memory;

pub use document::{load, modify, validate_key, Document, DocumentStore, Mutation};
pub use errors::{StoreError, StoreResult};
pub use file::FileDocumentStore;
pub use lock_table::LockTable;
pub use memory::MemoryDocumentStore;
