//! Shared handler state and session cookie handling

use std::sync::Arc;

use axum::http::{header, HeaderMap};

use super::errors::ApiError;
use crate::activity::ActivityLog;
use crate::auth::{AuthError, AuthorityConfig, AuthorityResolver, Identity};
use crate::comments::CommentService;
use crate::profiles::ProfileService;
use crate::store::DocumentStore;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Services shared by all handlers
pub struct AppState {
    pub authority: Arc<AuthorityResolver>,
    pub comments: CommentService,
    pub profiles: ProfileService,
    pub activity: ActivityLog,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, authority: AuthorityConfig, activity_limit: usize) -> Self {
        let activity = ActivityLog::new(store.clone(), activity_limit);
        let authority = Arc::new(AuthorityResolver::new(store.clone(), activity.clone(), authority));
        Self {
            comments: CommentService::new(store.clone(), authority.clone(), activity.clone()),
            profiles: ProfileService::new(store, authority.clone(), activity.clone()),
            authority,
            activity,
        }
    }

    /// Identity behind a session token, if any
    pub fn current_identity(&self, token: Option<&str>) -> Option<Identity> {
        token.and_then(|t| self.authority.resolve_identity(t))
    }

    /// Identity behind a session token, or 401
    pub fn require_identity(&self, token: Option<&str>) -> Result<Identity, ApiError> {
        self.current_identity(token)
            .ok_or(ApiError::Auth(AuthError::AuthenticationRequired))
    }
}

/// Runs a core call on the blocking pool.
///
/// Store access is synchronous file I/O; a panic inside `f` surfaces as a
/// 500 and the server keeps serving.
pub(crate) async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppState) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state)).await?
}

/// Session token from the `Cookie` header(s)
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that installs a session
pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// `Set-Cookie` value that clears the session
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE)
}
