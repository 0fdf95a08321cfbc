//! # Auth Errors
//!
//! Error types for identity resolution and authority checks.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No session, unknown session, or session expired
    #[error("Login required")]
    AuthenticationRequired,

    /// Authority check failed
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Missing or malformed input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::AuthenticationRequired => 401,
            AuthError::PermissionDenied(_) => 403,
            AuthError::Storage(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::AuthenticationRequired.status_code(), 401);
        assert_eq!(AuthError::PermissionDenied("admins only".into()).status_code(), 403);
        assert_eq!(AuthError::Validation("missing role".into()).status_code(), 400);
        assert_eq!(
            AuthError::Storage(StoreError::InvalidKey("x/y".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AuthError::AuthenticationRequired.is_client_error());
        assert!(!AuthError::Storage(StoreError::InvalidKey("x".into())).is_client_error());
    }
}
