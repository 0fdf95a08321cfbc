//! Comment HTTP Routes
//!
//! Listing, posting, voting and moderation under `/api/comments`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ApiError;
use super::state::{blocking, session_token, AppState};
use super::{StatusResponse, SUCCESS};
use crate::auth::AuthError;
use crate::comments::{Comment, NewComment, SortOrder, VoteType};

/// Comment routes with shared state
pub fn comment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/comments", get(list_handler).post(create_handler))
        .route("/comments/vote", post(vote_handler))
        .route("/comments/edit", post(edit_handler))
        .route("/comments/delete", post(delete_handler))
        .route("/comments/pin", post(pin_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "pageId")]
    pub page_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default, rename = "pageId")]
    pub page_id: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(default, rename = "pageId")]
    pub page_id: String,
    #[serde(default, rename = "commentId")]
    pub comment_id: String,
    #[serde(default, rename = "userId")]
    pub user_id: String,
    #[serde(default, rename = "voteType")]
    pub vote_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(default, rename = "pageId")]
    pub page_id: String,
    #[serde(default, rename = "commentId")]
    pub comment_id: String,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Body of delete and pin requests
#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    #[serde(default, rename = "pageId")]
    pub page_id: String,
    #[serde(default, rename = "commentId")]
    pub comment_id: String,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub status: &'static str,
    pub comments: Vec<Comment>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub status: &'static str,
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub status: &'static str,
    pub is_pinned: bool,
}

fn required(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::missing(field))
    } else {
        Ok(())
    }
}

fn parse_parent(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(id) => Uuid::parse_str(id)
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid parent_id '{}'", id))),
    }
}

// ==================
// Handlers
// ==================

async fn list_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let Query(query) = query?;
    let page_id = query
        .page_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::missing("pageId"))?;
    let order = SortOrder::parse_lenient(query.sort.as_deref());

    let comments = blocking(&state, move |s| Ok(s.comments.list(&page_id, order))).await?;
    Ok(Json(CommentsResponse {
        status: SUCCESS,
        total: comments.len(),
        comments,
    }))
}

/// Authenticated requests post as their identity; anonymous ones use the
/// body's author fields with the plain `user` role.
async fn create_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<CommentResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);
    let parent_id = parse_parent(req.parent_id.as_deref())?;

    let comment = blocking(&state, move |s| {
        let comment = match s.current_identity(token.as_deref()) {
            Some(identity) => s
                .comments
                .create_as(&identity, &req.page_id, &req.content, parent_id)?,
            None => {
                let mut new = NewComment::new(req.page_id, req.user, req.content);
                if let Some(user_id) = req.user_id.filter(|id| !id.trim().is_empty()) {
                    new = new.with_user_id(user_id);
                }
                if let Some(parent_id) = parent_id {
                    new = new.with_parent(parent_id);
                }
                if let Some(avatar) = req.avatar {
                    new = new.with_avatar(avatar);
                }
                s.comments.create(new)?
            }
        };
        Ok(comment)
    })
    .await?;

    Ok(Json(CommentResponse {
        status: SUCCESS,
        comment,
    }))
}

/// A resolved session votes as its own identity.
async fn vote_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    required(&req.page_id, "pageId")?;
    required(&req.comment_id, "commentId")?;
    let vote: VoteType = req.vote_type.parse().map_err(ApiError::BadRequest)?;
    let token = session_token(&headers);

    blocking(&state, move |s| {
        let voter = match s.current_identity(token.as_deref()) {
            Some(identity) => identity.id,
            None => req.user_id,
        };
        s.comments
            .vote(&req.page_id, &req.comment_id, &voter, vote)
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(StatusResponse { status: SUCCESS }))
}

async fn edit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);

    blocking(&state, move |s| {
        let identity = s.require_identity(token.as_deref())?;
        if let Some(claimed) = req.user_id.as_deref().filter(|id| !id.is_empty()) {
            if claimed != identity.id {
                return Err(AuthError::PermissionDenied("userId does not match session".into()).into());
            }
        }
        required(&req.page_id, "pageId")?;
        required(&req.comment_id, "commentId")?;
        s.comments
            .edit(&req.page_id, &req.comment_id, &identity, &req.content)?;
        Ok(())
    })
    .await?;

    Ok(Json(StatusResponse { status: SUCCESS }))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);

    blocking(&state, move |s| {
        let identity = s.require_identity(token.as_deref())?;
        required(&req.page_id, "pageId")?;
        required(&req.comment_id, "commentId")?;
        s.comments
            .soft_delete(&req.page_id, &req.comment_id, &identity)?;
        Ok(())
    })
    .await?;

    Ok(Json(StatusResponse { status: SUCCESS }))
}

async fn pin_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<TargetRequest>, JsonRejection>,
) -> Result<Json<PinResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);

    let is_pinned = blocking(&state, move |s| {
        let identity = s.require_identity(token.as_deref())?;
        required(&req.page_id, "pageId")?;
        required(&req.comment_id, "commentId")?;
        Ok(s.comments
            .toggle_pin(&req.page_id, &req.comment_id, &identity)?)
    })
    .await?;

    Ok(Json(PinResponse {
        status: SUCCESS,
        is_pinned,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parent() {
        assert_eq!(parse_parent(None).unwrap(), None);
        assert_eq!(parse_parent(Some("")).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(parse_parent(Some(&id.to_string())).unwrap(), Some(id));
        assert!(parse_parent(Some("nope")).is_err());
    }

    #[test]
    fn test_create_request_field_names() {
        let req: CreateCommentRequest = serde_json::from_str(
            r#"{"pageId": "p1", "user": "alice", "user_id": "1", "content": "hi", "parent_id": null}"#,
        )
        .unwrap();
        assert_eq!(req.page_id, "p1");
        assert_eq!(req.user_id.as_deref(), Some("1"));
        assert!(req.parent_id.is_none());
    }
}
