//! # Auth Module
//!
//! Session identity, roles, and the authority policy that gates mutating
//! operations.

pub mod errors;
pub mod identity;
pub mod session;
pub mod authority;

pub use authority::{AuthorityConfig, AuthorityResolver, PermissionsDocument, DEFAULT_OWNER_ID};
pub use errors::{AuthError, AuthResult};
pub use identity::{Identity, IdentityProfile, Role, UsersDocument};
pub use session::{Session, SessionConfig, SessionsDocument};
