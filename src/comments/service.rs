//! # Comment Service
//!
//! Every mutation is one read-modify-write of the `comments` document, so
//! concurrent creates, votes and moderation actions on a page never lose
//! each other's effects.
//!
//! Authority decisions (`is_admin`) are taken before the `comments` lock is
//! acquired, so at most one document lock is held at a time.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::{CommentError, CommentResult};
use super::model::{Comment, CommentsDocument, SortOrder, VoteType};
use super::sorter::CommentSorter;
use crate::activity::{ActivityAction, ActivityEntry, ActivityLog};
use crate::auth::{AuthorityResolver, Identity, Role};
use crate::store::{load, modify, DocumentStore, Mutation};

/// Input for a new comment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub page_id: String,
    /// Author display name
    pub user: String,
    pub user_id: Option<String>,
    pub text: String,
    pub parent_id: Option<Uuid>,
    pub role: Role,
    pub avatar: Option<String>,
}

impl NewComment {
    pub fn new(page_id: impl Into<String>, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            user: user.into(),
            user_id: None,
            text: text.into(),
            parent_id: None,
            role: Role::User,
            avatar: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// Comment operations over a document store
pub struct CommentService {
    store: Arc<dyn DocumentStore>,
    authority: Arc<AuthorityResolver>,
    activity: ActivityLog,
}

impl CommentService {
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

    /// Append a comment to its page.
    pub fn create(&self, new: NewComment) -> CommentResult<Comment> {
        if new.page_id.trim().is_empty() {
            return Err(CommentError::Validation("missing pageId".into()));
        }
        if new.text.trim().is_empty() {
            return Err(CommentError::Validation("missing content".into()));
        }
        if new.user.trim().is_empty() {
            return Err(CommentError::Validation("missing user".into()));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            page_id: new.page_id,
            user: new.user,
            user_id: new.user_id,
            parent_id: new.parent_id,
            text: new.text,
            created_at: Utc::now(),
            updated_at: None,
            is_pinned: false,
            is_deleted: false,
            likes: Default::default(),
            dislikes: Default::default(),
            role: new.role,
            avatar: new.avatar,
        };

        modify(self.store.as_ref(), |doc: &mut CommentsDocument| {
            doc.0
                .entry(comment.page_id.clone())
                .or_default()
                .push(comment.clone());
            Ok::<_, CommentError>(Mutation::Commit(()))
        })?;

        info!(page_id = %comment.page_id, comment_id = %comment.id, user = %comment.user, "comment created");
        let mut entry =
            ActivityEntry::new(ActivityAction::Commented, comment.page_id.clone()).with_user(comment.user.clone());
        if let Some(user_id) = &comment.user_id {
            entry = entry.with_user_id(user_id.clone());
        }
        self.activity.record_best_effort(entry);

        Ok(comment)
    }

    /// Create a comment authored by an authenticated identity.
    ///
    /// The stored role is the identity's effective role at creation time.
    pub fn create_as(
        &self,
        identity: &Identity,
        page_id: &str,
        text: &str,
        parent_id: Option<Uuid>,
    ) -> CommentResult<Comment> {
        let mut new = NewComment::new(page_id, identity.username.clone(), text)
            .with_user_id(identity.id.clone())
            .with_role(self.authority.effective_role(identity));
        new.parent_id = parent_id;
        new.avatar = identity.avatar.clone();
        self.create(new)
    }

    /// Like or dislike a comment. Unknown comments are ignored.
    ///
    /// Voting is allowed on deleted comments.
    pub fn vote(&self, page_id: &str, comment_id: &str, voter_id: &str, vote: VoteType) -> CommentResult<()> {
        if voter_id.trim().is_empty() {
            return Err(CommentError::Validation("missing userId".into()));
        }

        let applied = modify(self.store.as_ref(), |doc: &mut CommentsDocument| {
            Ok::<_, CommentError>(match doc.find_mut(page_id, comment_id) {
                Some(comment) => {
                    comment.vote(voter_id, vote);
                    Mutation::Commit(true)
                }
                None => Mutation::Abort(false),
            })
        })?;

        if !applied {
            debug!(page_id, comment_id, "vote on unknown comment ignored");
        }
        Ok(())
    }

    /// Replace the text of a comment. Author or admin only.
    pub fn edit(
        &self,
        page_id: &str,
        comment_id: &str,
        requester: &Identity,
        new_text: &str,
    ) -> CommentResult<Comment> {
        if new_text.trim().is_empty() {
            return Err(CommentError::Validation("missing content".into()));
        }
        let is_admin = self.authority.is_admin(requester);

        let edited = modify(self.store.as_ref(), |doc: &mut CommentsDocument| -> CommentResult<_> {
            let comment = doc
                .find_mut(page_id, comment_id)
                .ok_or_else(|| CommentError::not_found(page_id, comment_id))?;
            if !comment.is_authored_by(&requester.id) && !is_admin {
                return Err(CommentError::PermissionDenied(
                    "only the author or an admin may edit".into(),
                ));
            }
            if comment.is_deleted {
                return Err(CommentError::Deleted(comment.id));
            }
            comment.text = new_text.to_string();
            comment.updated_at = Some(Utc::now());
            Ok(Mutation::Commit(comment.clone()))
        })?;

        info!(page_id, comment_id, user = %requester.username, "comment edited");
        self.activity.record_best_effort(
            ActivityEntry::new(ActivityAction::Edited, page_id)
                .with_user(requester.username.clone())
                .with_user_id(requester.id.clone()),
        );
        Ok(edited)
    }

    /// Mark a comment deleted and replace its text. Author or admin only.
    ///
    /// The record is kept so replies stay attached. Deleting twice is a no-op.
    pub fn soft_delete(&self, page_id: &str, comment_id: &str, requester: &Identity) -> CommentResult<Comment> {
        let is_admin = self.authority.is_admin(requester);

        let (comment, changed) = modify(self.store.as_ref(), |doc: &mut CommentsDocument| -> CommentResult<_> {
            let comment = doc
                .find_mut(page_id, comment_id)
                .ok_or_else(|| CommentError::not_found(page_id, comment_id))?;
            if !comment.is_authored_by(&requester.id) && !is_admin {
                return Err(CommentError::PermissionDenied(
                    "only the author or an admin may delete".into(),
                ));
            }
            Ok(if comment.soft_delete() {
                Mutation::Commit((comment.clone(), true))
            } else {
                Mutation::Abort((comment.clone(), false))
            })
        })?;

        if changed {
            info!(page_id, comment_id, user = %requester.username, "comment deleted");
            self.activity.record_best_effort(
                ActivityEntry::new(ActivityAction::Deleted, page_id)
                    .with_user(requester.username.clone())
                    .with_user_id(requester.id.clone()),
            );
        }
        Ok(comment)
    }

    /// Flip the pinned flag. Admin only. Returns the new state.
    pub fn toggle_pin(&self, page_id: &str, comment_id: &str, requester: &Identity) -> CommentResult<bool> {
        if !self.authority.is_admin(requester) {
            return Err(CommentError::PermissionDenied("only admins may pin".into()));
        }

        let pinned = modify(self.store.as_ref(), |doc: &mut CommentsDocument| -> CommentResult<_> {
            let comment = doc
                .find_mut(page_id, comment_id)
                .ok_or_else(|| CommentError::not_found(page_id, comment_id))?;
            comment.is_pinned = !comment.is_pinned;
            Ok(Mutation::Commit(comment.is_pinned))
        })?;

        let action = if pinned {
            ActivityAction::Pinned
        } else {
            ActivityAction::Unpinned
        };
        info!(page_id, comment_id, pinned, "comment pin toggled");
        self.activity.record_best_effort(
            ActivityEntry::new(action, page_id)
                .with_user(requester.username.clone())
                .with_user_id(requester.id.clone()),
        );
        Ok(pinned)
    }

    /// All comments of a page (deleted ones included), pinned first.
    pub fn list(&self, page_id: &str, order: SortOrder) -> Vec<Comment> {
        let mut comments = load::<CommentsDocument>(self.store.as_ref()).page(page_id);
        CommentSorter::sort(&mut comments, order);
        comments
    }

    /// Single comment lookup
    pub fn get(&self, page_id: &str, comment_id: &str) -> Option<Comment> {
        load::<CommentsDocument>(self.store.as_ref())
            .find_mut(page_id, comment_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorityConfig, IdentityProfile, DEFAULT_OWNER_ID};
    use crate::comments::TOMBSTONE;
    use crate::store::MemoryDocumentStore;

    struct Fixture {
        service: CommentService,
        authority: Arc<AuthorityResolver>,
        activity: ActivityLog,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let activity = ActivityLog::new(store.clone(), 100);
        let authority = Arc::new(AuthorityResolver::new(
            store.clone(),
            activity.clone(),
            AuthorityConfig::default(),
        ));
        Fixture {
            service: CommentService::new(store, authority.clone(), activity.clone()),
            authority,
            activity,
        }
    }

    fn user(f: &Fixture, id: &str, name: &str) -> Identity {
        f.authority.save(IdentityProfile::new(id, name)).unwrap()
    }

    fn post(f: &Fixture, author: &Identity, text: &str) -> Comment {
        f.service.create_as(author, "p1", text, None).unwrap()
    }

    #[test]
    fn test_create_and_list() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");

        let listed = f.service.list("p1", SortOrder::Newest);
        assert_eq!(listed, vec![c.clone()]);
        assert_eq!(c.user, "alice");
        assert_eq!(c.user_id.as_deref(), Some("1"));
        assert!(!c.is_deleted && !c.is_pinned);
        assert!(f.service.list("p2", SortOrder::Newest).is_empty());
    }

    #[test]
    fn test_create_records_activity() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        post(&f, &alice, "hi");

        let entries = f.activity.entries(Some("alice"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "commented");
        assert_eq!(entries[0].target, "p1");
    }

    #[test]
    fn test_create_validation() {
        let f = fixture();
        assert!(matches!(
            f.service.create(NewComment::new("p1", "alice", "   ")),
            Err(CommentError::Validation(_))
        ));
        assert!(matches!(
            f.service.create(NewComment::new("", "alice", "hi")),
            Err(CommentError::Validation(_))
        ));
    }

    #[test]
    fn test_create_as_uses_effective_role() {
        let f = fixture();
        let owner = user(&f, DEFAULT_OWNER_ID, "founder");
        let c = post(&f, &owner, "welcome");
        assert_eq!(c.role, Role::Owner);
    }

    #[test]
    fn test_reply_keeps_parent() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let parent = post(&f, &alice, "question");
        let reply = f
            .service
            .create_as(&alice, "p1", "answer", Some(parent.id))
            .unwrap();
        assert_eq!(reply.parent_id, Some(parent.id));
    }

    #[test]
    fn test_vote_switching() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");
        let id = c.id.to_string();

        f.service.vote("p1", &id, "u", VoteType::Like).unwrap();
        f.service.vote("p1", &id, "u", VoteType::Like).unwrap();
        let c = f.service.get("p1", &id).unwrap();
        assert_eq!(c.likes.len(), 1);

        f.service.vote("p1", &id, "u", VoteType::Dislike).unwrap();
        let c = f.service.get("p1", &id).unwrap();
        assert!(c.likes.is_empty());
        assert!(c.dislikes.contains("u"));
    }

    #[test]
    fn test_vote_unknown_comment_is_noop() {
        let f = fixture();
        f.service
            .vote("p1", &Uuid::new_v4().to_string(), "u", VoteType::Like)
            .unwrap();
        f.service.vote("p1", "garbage", "u", VoteType::Like).unwrap();
        assert!(f.service.list("p1", SortOrder::Newest).is_empty());
    }

    #[test]
    fn test_edit_by_author() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");

        let edited = f
            .service
            .edit("p1", &c.id.to_string(), &alice, "hello")
            .unwrap();
        assert_eq!(edited.text, "hello");
        assert!(edited.updated_at.is_some());
    }

    #[test]
    fn test_edit_by_stranger_denied() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let mallory = user(&f, "2", "mallory");
        let c = post(&f, &alice, "hi");

        let err = f
            .service
            .edit("p1", &c.id.to_string(), &mallory, "pwned")
            .unwrap_err();
        assert!(matches!(err, CommentError::PermissionDenied(_)));
        assert_eq!(f.service.get("p1", &c.id.to_string()).unwrap().text, "hi");
    }

    #[test]
    fn test_admin_can_edit_and_delete_any() {
        let f = fixture();
        f.authority.grant("mod", Role::Admin).unwrap();
        let alice = user(&f, "1", "alice");
        let moderator = user(&f, "3", "mod");
        let c = post(&f, &alice, "hi");
        let id = c.id.to_string();

        f.service.edit("p1", &id, &moderator, "[redacted]").unwrap();
        let deleted = f.service.soft_delete("p1", &id, &moderator).unwrap();
        assert!(deleted.is_deleted);
    }

    #[test]
    fn test_soft_delete_keeps_record() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");
        let id = c.id.to_string();

        f.service.soft_delete("p1", &id, &alice).unwrap();
        f.service.soft_delete("p1", &id, &alice).unwrap();

        let listed = f.service.list("p1", SortOrder::Newest);
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_deleted);
        assert_eq!(listed[0].text, TOMBSTONE);

        // second delete did not log again
        let deletes = f
            .activity
            .entries(None)
            .into_iter()
            .filter(|e| e.action == "deleted")
            .count();
        assert_eq!(deletes, 1);
    }

    #[test]
    fn test_edit_deleted_comment_rejected() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");
        let id = c.id.to_string();
        f.service.soft_delete("p1", &id, &alice).unwrap();

        assert!(matches!(
            f.service.edit("p1", &id, &alice, "back"),
            Err(CommentError::Deleted(_))
        ));
    }

    #[test]
    fn test_missing_comment_not_found() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            f.service.edit("p1", &missing, &alice, "x"),
            Err(CommentError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.soft_delete("p1", &missing, &alice),
            Err(CommentError::NotFound { .. })
        ));
    }

    #[test]
    fn test_pin_requires_admin() {
        let f = fixture();
        let alice = user(&f, "1", "alice");
        let c = post(&f, &alice, "hi");

        assert!(matches!(
            f.service.toggle_pin("p1", &c.id.to_string(), &alice),
            Err(CommentError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_pin_toggles_and_sorts_first() {
        let f = fixture();
        let owner = user(&f, DEFAULT_OWNER_ID, "founder");
        let alice = user(&f, "1", "alice");
        let first = post(&f, &alice, "first");
        post(&f, &alice, "second");
        let id = first.id.to_string();

        assert!(f.service.toggle_pin("p1", &id, &owner).unwrap());
        let listed = f.service.list("p1", SortOrder::Newest);
        assert_eq!(listed[0].text, "first");

        assert!(!f.service.toggle_pin("p1", &id, &owner).unwrap());
        let listed = f.service.list("p1", SortOrder::Newest);
        assert_eq!(listed[0].text, "second");
    }

    #[test]
    fn test_concurrent_creates_are_all_kept() {
        let f = Arc::new(fixture());
        let alice = user(&f, "1", "alice");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let f = f.clone();
                let alice = alice.clone();
                std::thread::spawn(move || {
                    f.service
                        .create_as(&alice, "p1", &format!("c{}", i), None)
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(f.service.list("p1", SortOrder::Oldest).len(), 8);
    }
}
