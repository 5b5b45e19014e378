use sqlx::FromRow;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,        // Argon2 hash, never exposed
    pub session_generation: i32,      // bumped to invalidate issued tokens
}
