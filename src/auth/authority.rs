//! # Authority Resolution
//!
//! Session token → identity → effective role → admin decision.
//!
//! The effective role is taken from the first authority source that has an
//! opinion, in this order:
//! 1. the configured owner id (always `owner`)
//! 2. the `permissions` document, by identity id, then by username
//! 3. the role stored on the identity record

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::errors::{AuthError, AuthResult};
use super::identity::{Identity, IdentityProfile, Role, UsersDocument};
use super::session::{generate_token, Session, SessionConfig, SessionsDocument};
use crate::activity::{ActivityAction, ActivityEntry, ActivityLog};
use crate::store::{load, modify, Document, DocumentStore, Mutation};

/// Owner identity that can never be locked out
pub const DEFAULT_OWNER_ID: &str = "1021410672803844129";

/// The `permissions` document: username or identity id → role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionsDocument(pub BTreeMap<String, Role>);

impl Document for PermissionsDocument {
    const KEY: &'static str = "permissions";
}

impl PermissionsDocument {
    /// Map entry for an identity: id first, then username
    pub fn role_for(&self, id: &str, username: &str) -> Option<Role> {
        self.0
            .get(id)
            .or_else(|| self.0.get(username))
            .copied()
    }
}

/// Authority configuration
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    /// Hardcoded owner identity id
    pub owner_id: String,
    pub session: SessionConfig,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            owner_id: DEFAULT_OWNER_ID.to_string(),
            session: SessionConfig::default(),
        }
    }
}

/// Resolves sessions to identities and identities to roles.
pub struct AuthorityResolver {
    store: Arc<dyn DocumentStore>,
    activity: ActivityLog,
    config: AuthorityConfig,
}

impl AuthorityResolver {
    pub fn new(store: Arc<dyn DocumentStore>, activity: ActivityLog, config: AuthorityConfig) -> Self {
        Self {
            store,
            activity,
            config,
        }
    }

    pub fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Role granted by the owner override or the permissions map, if any.
    fn override_role(&self, permissions: &PermissionsDocument, id: &str, username: &str) -> Option<Role> {
        if id == self.config.owner_id {
            return Some(Role::Owner);
        }
        permissions.role_for(id, username)
    }

    /// Effective role of an identity.
    pub fn effective_role(&self, identity: &Identity) -> Role {
        let permissions = load::<PermissionsDocument>(self.store.as_ref());
        self.override_role(&permissions, &identity.id, &identity.username)
            .unwrap_or(identity.role)
    }

    /// Whether the identity may moderate any comment
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.effective_role(identity).is_admin()
    }

    /// Identity record by id
    pub fn identity(&self, user_id: &str) -> Option<Identity> {
        load::<UsersDocument>(self.store.as_ref()).0.remove(user_id)
    }

    /// Resolve a session token to its identity.
    ///
    /// Unknown or expired tokens, and sessions whose identity no longer
    /// exists, resolve to `None`.
    pub fn resolve_identity(&self, token: &str) -> Option<Identity> {
        self.resolve_identity_at(token, Utc::now())
    }

    pub fn resolve_identity_at(&self, token: &str, now: DateTime<Utc>) -> Option<Identity> {
        if token.is_empty() {
            return None;
        }
        let sessions = load::<SessionsDocument>(self.store.as_ref());
        let session = sessions.0.get(token)?;
        if session.is_expired(&self.config.session, now) {
            debug!(user_id = %session.user_id, "session expired");
            return None;
        }
        self.identity(&session.user_id)
    }

    /// Upsert an identity after successful authentication.
    ///
    /// The stored role is replaced only when the owner override or the
    /// permissions map has an opinion; otherwise a previously stored role is
    /// kept (first login defaults to `user`).
    pub fn save(&self, profile: IdentityProfile) -> AuthResult<Identity> {
        if profile.id.trim().is_empty() || profile.username.trim().is_empty() {
            return Err(AuthError::Validation("identity requires id and username".into()));
        }

        // Read before taking the users lock: one key lock at a time.
        let permissions = load::<PermissionsDocument>(self.store.as_ref());
        let override_role = self.override_role(&permissions, &profile.id, &profile.username);

        modify(self.store.as_ref(), |users: &mut UsersDocument| {
            let stored_role = users.0.get(&profile.id).map(|existing| existing.role);
            let identity = Identity {
                id: profile.id.clone(),
                username: profile.username.clone(),
                avatar: profile.avatar.clone(),
                role: override_role.or(stored_role).unwrap_or_default(),
            };
            users.0.insert(identity.id.clone(), identity.clone());
            Ok::<_, AuthError>(Mutation::Commit(identity))
        })
    }

    /// Create a session for an identity and return its token.
    pub fn create_session(&self, user_id: &str) -> AuthResult<String> {
        let token = generate_token();
        let session = Session::new(user_id);
        modify(self.store.as_ref(), |sessions: &mut SessionsDocument| {
            sessions.0.insert(token.clone(), session);
            Ok::<_, AuthError>(Mutation::Commit(()))
        })?;
        Ok(token)
    }

    /// `save` followed by `create_session`.
    ///
    /// The two writes are independent; a crash in between leaves an updated
    /// identity without a session.
    pub fn login(&self, profile: IdentityProfile) -> AuthResult<(Identity, String)> {
        let identity = self.save(profile)?;
        let token = self.create_session(&identity.id)?;
        info!(user_id = %identity.id, username = %identity.username, "login");
        Ok((identity, token))
    }

    /// Remove a session record. Returns whether it existed.
    pub fn revoke_session(&self, token: &str) -> AuthResult<bool> {
        modify(self.store.as_ref(), |sessions: &mut SessionsDocument| {
            Ok::<_, AuthError>(match sessions.0.remove(token) {
                Some(_) => Mutation::Commit(true),
                None => Mutation::Abort(false),
            })
        })
    }

    /// Drop expired sessions. Returns the number removed.
    pub fn purge_expired_sessions(&self) -> AuthResult<usize> {
        let now = Utc::now();
        let config = self.config.session.clone();
        modify(self.store.as_ref(), |sessions: &mut SessionsDocument| {
            let before = sessions.0.len();
            sessions.0.retain(|_, s| !s.is_expired(&config, now));
            let removed = before - sessions.0.len();
            Ok::<_, AuthError>(if removed > 0 {
                Mutation::Commit(removed)
            } else {
                Mutation::Abort(0)
            })
        })
    }

    /// Current permissions map
    pub fn permissions(&self) -> PermissionsDocument {
        load::<PermissionsDocument>(self.store.as_ref())
    }

    /// Set a permissions map entry. Requires an admin requester.
    pub fn set_permission(&self, requester: &Identity, target: &str, role: Role) -> AuthResult<()> {
        if !self.is_admin(requester) {
            return Err(AuthError::PermissionDenied("admins only".into()));
        }
        self.grant(target, role)?;

        self.activity.record_best_effort(
            ActivityEntry::new(ActivityAction::RoleChanged, target)
                .with_user(requester.username.clone())
                .with_user_id(requester.id.clone()),
        );
        Ok(())
    }

    /// Set a permissions map entry without an authority check (operator CLI).
    pub fn grant(&self, target: &str, role: Role) -> AuthResult<()> {
        let target = target.trim();
        if target.is_empty() {
            return Err(AuthError::Validation("missing target user".into()));
        }
        modify(self.store.as_ref(), |permissions: &mut PermissionsDocument| {
            permissions.0.insert(target.to_string(), role);
            Ok::<_, AuthError>(Mutation::Commit(()))
        })?;
        info!(target, role = %role, "permission set");
        Ok(())
    }

    /// Remove a permissions map entry (operator CLI). Returns whether it existed.
    pub fn revoke_permission(&self, target: &str) -> AuthResult<bool> {
        modify(self.store.as_ref(), |permissions: &mut PermissionsDocument| {
            Ok::<_, AuthError>(match permissions.0.remove(target) {
                Some(_) => Mutation::Commit(true),
                None => Mutation::Abort(false),
            })
        })
    }
}
