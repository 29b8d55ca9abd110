//! Credential storage for the auth subsystem.
//!
//! The auth code only sees the [`CredentialStore`] trait; the host picks the
//! backing adapter at startup.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::InMemoryCredentialStore;
pub use models::{NewUser, User};
pub use postgres::PgCredentialStore;
pub use store::CredentialStore;
