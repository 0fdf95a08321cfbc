//! User profiles
//!
//! Free-form banner and bio per username, stored as the `profiles`
//! document. A profile may be changed by its owner or by an admin.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activity::{ActivityAction, ActivityEntry, ActivityLog};
use crate::auth::{AuthError, AuthResult, AuthorityResolver, Identity};
use crate::store::{load, modify, Document, DocumentStore, Mutation};

/// Profile of one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Partial profile change; `None` fields are left as they are
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile) {
        if let Some(banner) = self.banner {
            profile.banner = Some(banner);
        }
        if let Some(bio) = self.bio {
            profile.bio = Some(bio);
        }
    }
}

/// The `profiles` document: username → profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfilesDocument(pub BTreeMap<String, Profile>);

impl Document for ProfilesDocument {
    const KEY: &'static str = "profiles";
}

pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    authority: Arc<AuthorityResolver>,
    activity: ActivityLog,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        authority: Arc<AuthorityResolver>,
        activity: ActivityLog,
    ) -> Self {
        Self {
            store,
            authority,
            activity,
        }
    }

    /// Profile for `username`; empty if none was saved.
    pub fn get(&self, username: &str) -> Profile {
        load::<ProfilesDocument>(self.store.as_ref())
            .0
            .remove(username)
            .unwrap_or_default()
    }

    pub fn update(&self, requester: &Identity, username: &str, update: ProfileUpdate) -> AuthResult<Profile> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username required".into()));
        }
        if requester.username != username && !self.authority.is_admin(requester) {
            return Err(AuthError::PermissionDenied(
                "only the profile owner or an admin may edit it".into(),
            ));
        }

        let profile = modify(self.store.as_ref(), |doc: &mut ProfilesDocument| {
            let profile = doc.0.entry(username.to_string()).or_default();
            update.apply(profile);
            Ok::<_, AuthError>(Mutation::Commit(profile.clone()))
        })?;

        info!(username, by = %requester.username, "profile updated");
        self.activity.record_best_effort(
            ActivityEntry::new(ActivityAction::ProfileUpdated, username)
                .with_user(requester.username.clone())
                .with_user_id(requester.id.clone()),
        );
        Ok(profile)
    }
}
