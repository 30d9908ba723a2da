use thiserror::Error;

use crate::db_types::{NewUser, User};

/// User account storage consumed by the authentication layer. Password hashing and token
/// issuance live in the server; the engine only persists and resolves accounts.
#[allow(async_fn_in_trait)]
pub trait AuthManagement: Clone {
    /// Creates a new user account. The email must be unique.
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("A user with email {0} already exists")]
    EmailTaken(String),
    #[error("User account not found")]
    UserNotFound,
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
