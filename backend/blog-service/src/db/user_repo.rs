use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Mirror a user record locally (used by the admin command)
pub async fn create_user(pool: &PgPool, username: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username)
        VALUES ($1, $2)
        RETURNING id, username, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await
}
