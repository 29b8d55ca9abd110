use async_trait::async_trait;

use crate::db::models::{NewUser, User};
use crate::error::StoreError;

/// Persistence boundary for user accounts.
///
/// Implementations report every failure as a [`StoreError`]. A unique-email
/// violation on insert must come back as [`StoreError::Duplicate`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact, case-sensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}
