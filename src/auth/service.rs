use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::password::PasswordService;
use crate::auth::token::TokenCodec;
use crate::db::models::{NewUser, User};
use crate::db::store::CredentialStore;
use crate::error::{AppError, AuthError, StoreError};

/// A user who just proved their credentials, plus the token issued for them.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub token: String,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    tokens: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        Self {
            store,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenCodec> {
        &self.tokens
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<IssuedSession, AppError> {
        validate_credentials(email, password)?;
        if !email.contains('@') {
            return Err(AppError::ValidationError("email is malformed".into()));
        }

        if self.find_user(email).await?.is_some() {
            // Burn a hash's worth of time so a conflict is not faster than a success
            self.passwords.verify_dummy(password).await?;
            return Err(AppError::Conflict);
        }

        let password_hash = self.passwords.hash(password).await?;
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let new_user = NewUser::new(email, display_name);

        let user = match self.store.create_user(&new_user, &password_hash).await {
            Ok(user) => user,
            Err(StoreError::Duplicate) => return Err(AppError::Conflict),
            Err(e) => {
                error!("Failed to create user: {}", e);
                return Err(e.into());
            }
        };

        info!("Created user {}", user.id);
        self.issue_session(user)
    }

    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedSession, AppError> {
        validate_credentials(email, password)?;

        let user = match self.find_user(email).await? {
            Some(user) => user,
            None => {
                self.passwords.verify_dummy(password).await?;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.passwords.verify(password, &user.password_hash).await? {
            warn!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        self.issue_session(user)
    }

    async fn find_user(&self, email: &str) -> Result<Option<User>, AppError> {
        self.store.find_user_by_email(email).await.map_err(|e| {
            error!("Failed to look up user by email: {}", e);
            e.into()
        })
    }

    fn issue_session(&self, user: User) -> Result<IssuedSession, AppError> {
        let token = self.tokens.issue(user.id)?;
        Ok(IssuedSession { user, token })
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::ValidationError("email is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::ValidationError("password is required".into()));
    }
    Ok(())
}
