//! Authentication for the todo API.
//!
//! Registration and login live under `/api/auth`; every other `/api` route is
//! wrapped in [`RequireAuth`], which verifies the session token and exposes
//! the caller as an [`AuthenticatedUser`].

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use middleware::{AuthenticatedUser, RequireAuth};
pub use password::PasswordService;
pub use service::{AuthService, IssuedSession};
pub use token::{Claims, TokenCodec};
