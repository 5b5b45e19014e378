use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    password::{hash_password, normalize_username, verify_password, MIN_PASSWORD_LEN},
    repo_types::User,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[instrument(skip(state, password))]
pub async fn signup(state: &AppState, username: &str, password: &str) -> ApiResult<Session> {
    let Some(username) = normalize_username(username) else {
        warn!("invalid username");
        return Err(ApiError::validation(
            "username",
            "3-32 characters from a-z, 0-9, '.', '_' or '-'",
        ));
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(
            "password",
            format!("at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let hash = hash_password(password).map_err(ApiError::Persistence)?;
    let Some(user) = state
        .users
        .create(&username, &hash)
        .await
        .map_err(ApiError::Persistence)?
    else {
        warn!(%username, "username already registered");
        return Err(ApiError::Conflict("username already taken".into()));
    };

    let token = state
        .jwt
        .sign(user.id, user.session_generation)
        .map_err(ApiError::Persistence)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Session { token, user })
}

/// Every successful login starts a new session generation; older tokens stop working.
#[instrument(skip(state, password))]
pub async fn login(state: &AppState, username: &str, password: &str) -> ApiResult<Session> {
    let username = username.trim().to_lowercase();
    let Some(mut user) = state
        .users
        .find_by_username(&username)
        .await
        .map_err(ApiError::Persistence)?
    else {
        warn!(%username, "login unknown username");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash).map_err(ApiError::Persistence)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    user.session_generation = state
        .users
        .rotate_session(user.id)
        .await
        .map_err(ApiError::Persistence)?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = state
        .jwt
        .sign(user.id, user.session_generation)
        .map_err(ApiError::Persistence)?;
    info!(user_id = %user.id, generation = user.session_generation, "user logged in");
    Ok(Session { token, user })
}

#[instrument(skip(state))]
pub async fn logout(state: &AppState, user_id: Uuid) -> ApiResult<bool> {
    let generation = state
        .users
        .rotate_session(user_id)
        .await
        .map_err(ApiError::Persistence)?
        .ok_or(ApiError::Unauthenticated)?;
    info!(%user_id, generation, "sessions revoked");
    Ok(true)
}

#[instrument(skip(state))]
pub async fn me(state: &AppState, user_id: Option<Uuid>) -> ApiResult<Option<User>> {
    let Some(user_id) = user_id else {
        return Ok(None);
    };
    state
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::Persistence)
}
