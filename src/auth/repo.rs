use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

use crate::{auth::repo_types::User, db::PgStore};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// `None` when the username is already taken.
    async fn create(&self, username: &str, password_hash: &str) -> anyhow::Result<Option<User>>;
    /// Increments the session generation and returns the new value.
    async fn rotate_session(&self, id: Uuid) -> anyhow::Result<Option<i32>>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, session_generation
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, session_generation
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, password_hash, session_generation
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .context("create user")?;
        Ok(user)
    }

    async fn rotate_session(&self, id: Uuid) -> anyhow::Result<Option<i32>> {
        let generation = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
               SET session_generation = session_generation + 1
             WHERE id = $1
            RETURNING session_generation
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("rotate session generation")?;
        Ok(generation)
    }
}
