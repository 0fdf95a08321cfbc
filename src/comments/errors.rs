//! # Comment Errors

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Result type for comment operations
pub type CommentResult<T> = Result<T, CommentError>;

/// Comment operation errors
#[derive(Debug, Clone, Error)]
pub enum CommentError {
    /// Missing or malformed input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Requester is neither the author nor an admin
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Referenced comment does not exist on the page
    #[error("Comment {comment_id} not found on page {page_id}")]
    NotFound { page_id: String, comment_id: String },

    /// Content edits are rejected once a comment is soft-deleted
    #[error("Comment {0} has been deleted")]
    Deleted(Uuid),

    /// Storage operation failed; the mutation was not applied
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CommentError {
    pub(crate) fn not_found(page_id: &str, comment_id: &str) -> Self {
        CommentError::NotFound {
            page_id: page_id.to_string(),
            comment_id: comment_id.to_string(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CommentError::Validation(_) => 400,
            CommentError::PermissionDenied(_) => 403,
            CommentError::NotFound { .. } => 404,
            CommentError::Deleted(_) => 409,
            CommentError::Storage(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<AuthError> for CommentError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => CommentError::Validation(msg),
            AuthError::AuthenticationRequired => {
                CommentError::PermissionDenied("login required".into())
            }
            AuthError::PermissionDenied(msg) => CommentError::PermissionDenied(msg),
            AuthError::Storage(e) => CommentError::Storage(e),
        }
    }
}
