//! Auth HTTP Routes
//!
//! Session introspection and logout. Sessions are created by the login
//! flow (or `scriptorium session` in development) and travel in the
//! `session` cookie.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::{info, warn};

use super::errors::ApiError;
use super::state::{blocking, clear_session_cookie, session_token, AppState};
use super::SUCCESS;
use crate::auth::{Identity, Role};

/// Routes nested under `/api`
pub fn user_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/user/me", get(me_handler))
        .with_state(state)
}

/// Routes nested under `/auth`
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/logout", get(logout_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    /// Effective role, after owner and permissions overrides
    pub role: Role,
}

impl UserResponse {
    fn new(identity: Identity, role: Role) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            avatar: identity.avatar,
            role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub status: &'static str,
    pub user: UserResponse,
}

/// Current user (401 without a live session)
async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let token = session_token(&headers);
    let user = blocking(&state, move |s| {
        let identity = s.require_identity(token.as_deref())?;
        let role = s.authority.effective_role(&identity);
        Ok(UserResponse::new(identity, role))
    })
    .await?;

    Ok(Json(MeResponse {
        status: SUCCESS,
        user,
    }))
}

/// Revoke the session, clear the cookie and redirect home.
///
/// The cookie is cleared even if the server-side revoke fails.
async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        let revoked = blocking(&state, move |s| Ok(s.authority.revoke_session(&token)?)).await;
        match revoked {
            Ok(true) => info!("session revoked"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "session revoke failed"),
        }
    }

    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, clear_session_cookie()),
            (header::LOCATION, "/".to_string()),
        ],
    )
        .into_response()
}
