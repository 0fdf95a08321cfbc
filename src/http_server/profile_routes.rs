//! Profile HTTP Routes

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
use crate::profiles::{Profile, ProfileUpdate};

/// Routes nested under `/api`
pub fn profile_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(get_profile_handler).post(update_profile_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub update: ProfileUpdate,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub status: &'static str,
    pub profile: Profile,
}

async fn get_profile_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Query(query) = query?;
    let username = query
        .user
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::missing("user"))?;

    let profile = blocking(&state, move |s| Ok(s.profiles.get(&username))).await?;
    Ok(Json(ProfileResponse {
        status: SUCCESS,
        profile,
    }))
}

/// Owner of the profile or admin
async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    let token = session_token(&headers);

    blocking(&state, move |s| {
        let requester = s.require_identity(token.as_deref())?;
        s.profiles.update(&requester, &req.username, req.update)?;
        Ok(())
    })
    .await?;

    Ok(Json(StatusResponse { status: SUCCESS }))
}
