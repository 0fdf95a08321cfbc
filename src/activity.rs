//! Activity Log
//!
//! Append-only record of moderation and administration actions, stored as
//! the `activity` document (newest first, bounded length).
//!
//! Appends made as a side effect of another operation are best-effort: a
//! failed append is logged and never fails the operation that caused it.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{load, modify, Document, DocumentStore, Mutation, StoreError, StoreResult};

/// Default maximum number of retained entries
pub const DEFAULT_ACTIVITY_LIMIT: usize = 1000;

/// Activity action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    /// A comment was posted.
    Commented,
    /// A comment was edited.
    Edited,
    /// A comment was soft-deleted.
    Deleted,
    /// A comment was pinned.
    Pinned,
    /// A comment was unpinned.
    Unpinned,
    /// A permissions map entry changed.
    RoleChanged,
    /// A user profile changed.
    ProfileUpdated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Commented => "commented",
            ActivityAction::Edited => "edited",
            ActivityAction::Deleted => "deleted",
            ActivityAction::Pinned => "pinned",
            ActivityAction::Unpinned => "unpinned",
            ActivityAction::RoleChanged => "role_changed",
            ActivityAction::ProfileUpdated => "profile_updated",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single activity entry.
///
/// `action` is kept as a string so entries written by other tools decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Display name of the actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Identity id of the actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub action: String,

    /// What was acted on (page id, comment id, username)
    pub target: String,

    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(action: ActivityAction, target: impl Into<String>) -> Self {
        Self {
            user: None,
            user_id: None,
            action: action.as_str().to_string(),
            target: target.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, name: impl Into<String>) -> Self {
        self.user = Some(name.into());
        self
    }

    pub fn with_user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }
}

/// The `activity` document: entries, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityDocument(pub Vec<ActivityEntry>);

impl Document for ActivityDocument {
    const KEY: &'static str = "activity";
}

/// Bounded activity log over a document store.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn DocumentStore>,
    limit: usize,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn DocumentStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Prepend an entry, dropping the oldest beyond the limit.
    pub fn record(&self, entry: ActivityEntry) -> StoreResult<()> {
        let limit = self.limit;
        modify(self.store.as_ref(), |doc: &mut ActivityDocument| {
            doc.0.insert(0, entry);
            doc.0.truncate(limit);
            Ok::<_, StoreError>(Mutation::Commit(()))
        })
    }

    /// Like [`record`](Self::record) but only logs on failure.
    pub fn record_best_effort(&self, entry: ActivityEntry) {
        let action = entry.action.clone();
        if let Err(e) = self.record(entry) {
            warn!(action = %action, error = %e, "activity append failed");
        }
    }

    /// Entries, newest first, optionally only those of one user.
    pub fn entries(&self, user: Option<&str>) -> Vec<ActivityEntry> {
        let mut entries: Vec<ActivityEntry> = load::<ActivityDocument>(self.store.as_ref())
            .0
            .into_iter()
            .filter(|e| match user {
                Some(name) => e.user.as_deref() == Some(name),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }
}

impl fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLog")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
