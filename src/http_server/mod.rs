//! # HTTP Server Module
//!
//! axum adapter over the comment, authority and profile services.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/comments*` - Listing, posting, voting, moderation
//! - `/api/user/me`, `/auth/logout` - Session
//! - `/api/permissions`, `/api/activity` - Administration
//! - `/api/profile` - User profiles

use serde::Serialize;

pub mod config;
pub mod errors;
pub mod state;
pub mod server;
pub mod comment_routes;
pub mod auth_routes;
pub mod admin_routes;
pub mod profile_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use server::{build_router, HttpServer};
pub use state::{session_cookie, session_token, AppState, SESSION_COOKIE};

/// `status` value of successful responses
pub const SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
