use std::fmt::Debug;

use crate::{
    db_types::{NewUser, User},
    traits::{AuthApiError, AuthManagement},
};

/// The `AuthApi` resolves and creates user accounts. Credential checks and token issuance are the
/// server's concern; this API only touches storage.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        self.db.create_user(user).await
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user_by_email(email).await
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user(user_id).await
    }
}
