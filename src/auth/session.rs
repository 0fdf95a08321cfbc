//! # Session Management
//!
//! Sessions are stored in the `sessions` document, keyed by the opaque
//! token handed to the client in the `session` cookie.
//!
//! ## Invariants
//! - Sessions expire `ttl` after creation
//! - Logout removes the session record immediately

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Document;

/// Longest accepted session lifetime
pub const MAX_TTL_DAYS: i64 = 36_500;

/// Session model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Identity this session belongs to
    pub user_id: String,

    /// When the session was created
    #[serde(with = "crate::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Saturates at the latest representable instant.
    pub fn expires_at(&self, config: &SessionConfig) -> DateTime<Utc> {
        self.created_at
            .checked_add_signed(config.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, config: &SessionConfig, now: DateTime<Utc>) -> bool {
        self.expires_at(config) <= now
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session lifetime
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::days(30),
        }
    }
}

impl SessionConfig {
    /// `days` is clamped to `1..=MAX_TTL_DAYS`.
    pub fn with_ttl_days(days: i64) -> Self {
        Self {
            ttl: Duration::days(days.clamp(1, MAX_TTL_DAYS)),
        }
    }
}

/// Generate a fresh opaque session token
pub fn generate_token() -> String {
    Uuid::new_v4().to_string()
}

/// The `sessions` document: token → session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionsDocument(pub BTreeMap<String, Session>);

impl Document for SessionsDocument {
    const KEY: &'static str = "sessions";
}
