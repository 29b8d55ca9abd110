use sqlx::FromRow;

/// A stored account. Only the store and the auth service ever see `password_hash`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[sqlx(rename = "hash")]
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Public fields of an account about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            email: email.into(),
            display_name,
        }
    }
}
