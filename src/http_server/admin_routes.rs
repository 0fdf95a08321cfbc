//! Permissions and activity HTTP Routes

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::HeaderMap,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::errors::ApiError;
use super::state::{blocking, session_token, AppState};
use super::{StatusResponse, SUCCESS};
use crate::activity::ActivityEntry;
use crate::auth::Role;

/// Routes nested under `/api`
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/permissions", get(list_permissions_handler).post(set_permission_handler))
        .route("/activity", get(activity_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: String,
}

impl SetPermissionRequest {
    /// Username wins over id when both are given
    fn target(&self) -> Option<&str> {
        [self.username.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub status: &'static str,
    pub permissions: BTreeMap<String, Role>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub status: &'static str,
    pub activity: Vec<ActivityEntry>,
}

async fn list_permissions_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let permissions = blocking(&state, |s| Ok(s.authority.permissions().0)).await?;
    Ok(Json(PermissionsResponse {
        status: SUCCESS,
        permissions,
    }))
}

/// Admin only
async fn set_permission_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SetPermissionRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);

    blocking(&state, move |s| {
        let requester = s.require_identity(token.as_deref())?;
        let target = req.target().ok_or_else(|| ApiError::missing("username or id"))?;
        let role = Role::parse(&req.role)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown role '{}'", req.role)))?;
        s.authority.set_permission(&requester, target, role)?;
        Ok(())
    })
    .await?;

    Ok(Json(StatusResponse { status: SUCCESS }))
}

async fn activity_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let Query(query) = query?;
    let user = query.user.filter(|u| !u.trim().is_empty());
    let activity = blocking(&state, move |s| Ok(s.activity.entries(user.as_deref()))).await?;
    Ok(Json(ActivityResponse {
        status: SUCCESS,
        activity,
    }))
}
