use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::models::{NewUser, User};
use crate::db::store::CredentialStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Users {
    by_email: HashMap<String, User>,
    next_id: i64,
}

/// Process-local [`CredentialStore`]. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Users>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.by_email.get(email).cloned())
    }

    async fn create_user(
        &self,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.by_email.contains_key(&new_user.email) {
            return Err(StoreError::Duplicate);
        }

        users.next_id += 1;
        let user = User {
            id: users.next_id,
            email: new_user.email.clone(),
            password_hash: password_hash.to_string(),
            display_name: new_user.display_name.clone(),
        };
        users.by_email.insert(user.email.clone(), user.clone());
        Ok(user)
    }
}
