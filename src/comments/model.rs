//! Comment records and the `comments` document.
//!
//! ## Invariants
//! - `id` is assigned once at creation and never changes
//! - a voter is in at most one of `likes` / `dislikes`
//! - `is_deleted` implies `text == TOMBSTONE`; deleted records are kept

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Role;
use crate::store::Document;

/// Text that replaces the content of a soft-deleted comment
pub const TOMBSTONE: &str = "[This comment has been deleted]";

/// A comment on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,

    /// Back-filled from the enclosing page key for older records
    #[serde(default, deserialize_with = "null_as_default")]
    pub page_id: String,

    /// Author display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub parent_id: Option<Uuid>,

    /// Edits by older servers could store `null` here
    #[serde(rename = "content", default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, with = "crate::timestamp::or_epoch")]
    pub created_at: DateTime<Utc>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_pinned: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_deleted: bool,

    #[serde(default, deserialize_with = "deserialize_voters")]
    pub likes: BTreeSet<String>,

    #[serde(default, deserialize_with = "deserialize_voters")]
    pub dislikes: BTreeSet<String>,

    /// Author's role when the comment was posted
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,

    #[serde(default)]
    pub avatar: Option<String>,
}

/// `null` in older documents reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Voter lists may contain nulls or numeric ids in older documents.
fn deserialize_voters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

impl Comment {
    /// likes minus dislikes
    pub fn score(&self) -> i64 {
        self.likes.len() as i64 - self.dislikes.len() as i64
    }

    /// Record a vote, replacing any earlier vote by the same voter.
    pub fn vote(&mut self, voter_id: &str, vote: VoteType) {
        self.likes.remove(voter_id);
        self.dislikes.remove(voter_id);
        match vote {
            VoteType::Like => self.likes.insert(voter_id.to_string()),
            VoteType::Dislike => self.dislikes.insert(voter_id.to_string()),
        };
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Mark deleted and replace the content. Returns false if it already was.
    pub fn soft_delete(&mut self) -> bool {
        let changed = !self.is_deleted || self.text != TOMBSTONE;
        self.is_deleted = true;
        self.text = TOMBSTONE.to_string();
        changed
    }
}

/// Vote direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Like,
    Dislike,
}

impl FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteType::Like),
            "dislike" => Ok(VoteType::Dislike),
            other => Err(format!("unknown vote type '{}'", other)),
        }
    }
}

/// Secondary ordering applied after pinned-first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Top,
}

impl SortOrder {
    /// Parse a query value; anything unrecognised means `newest`.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("oldest") => SortOrder::Oldest,
            Some("top") => SortOrder::Top,
            _ => SortOrder::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Top => "top",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `comments` document: page id → comments in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentsDocument(pub BTreeMap<String, Vec<Comment>>);

impl Document for CommentsDocument {
    const KEY: &'static str = "comments";
}

impl CommentsDocument {
    /// Comment on `page_id` with the given id. Malformed ids match nothing.
    pub fn find_mut(&mut self, page_id: &str, comment_id: &str) -> Option<&mut Comment> {
        let id = Uuid::parse_str(comment_id.trim()).ok()?;
        self.0
            .get_mut(page_id)?
            .iter_mut()
            .find(|c| c.id == id)
    }

    /// Comments of a page, with `page_id` back-filled
    pub fn page(&self, page_id: &str) -> Vec<Comment> {
        self.0
            .get(page_id)
            .map(|comments| {
                comments
                    .iter()
                    .cloned()
                    .map(|mut c| {
                        if c.page_id.is_empty() {
                            c.page_id = page_id.to_string();
                        }
                        c
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
