use sqlx::PgConnection;

use crate::{
    db_types::{NewUser, User},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut PgConnection) -> Result<User, AuthApiError> {
    let email = user.email.clone();
    let result: Result<User, sqlx::Error> = sqlx::query_as(
        r#"
            INSERT INTO users (email, password_hash, name, phone_number)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.name)
    .bind(user.phone_number)
    .fetch_one(conn)
    .await;
    result.map_err(|e| match e {
        sqlx::Error::Database(de) if de.is_unique_violation() => AuthApiError::EmailTaken(email),
        e => AuthApiError::DatabaseError(e.to_string()),
    })
}

pub async fn fetch_user(user_id: i64, conn: &mut PgConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut PgConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}
