use async_graphql::Context;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{jwt::JwtKeys, repo::UserRepo};
use crate::{error::ApiError, state::AppState};

/// Identity resolved for a single request. `None` is an anonymous caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer(pub Option<Uuid>);

impl Viewer {
    pub fn from_ctx(ctx: &Context<'_>) -> Self {
        ctx.data_opt::<Viewer>().copied().unwrap_or_default()
    }

    pub fn require(self) -> Result<Uuid, ApiError> {
        self.0.ok_or(ApiError::Unauthenticated)
    }
}

/// Why a presented token was refused. Logged only; callers just become anonymous.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed or unverifiable token")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("user {0} no longer exists")]
    UnknownUser(Uuid),

    #[error("token generation {presented} superseded by {current}")]
    Stale { presented: i32, current: i32 },

    #[error("user lookup failed")]
    Lookup(#[source] anyhow::Error),
}

pub async fn verify_session(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    token: &str,
) -> Result<Uuid, SessionError> {
    let claims = keys.verify(token).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid(e),
    })?;

    let user = users
        .find_by_id(claims.sub)
        .await
        .map_err(SessionError::Lookup)?
        .ok_or(SessionError::UnknownUser(claims.sub))?;

    if user.session_generation != claims.generation {
        return Err(SessionError::Stale {
            presented: claims.generation,
            current: user.session_generation,
        });
    }
    Ok(user.id)
}

pub enum Bearer<'a> {
    Absent,
    Malformed,
    Token(&'a str),
}

pub fn bearer_token(headers: &HeaderMap) -> Bearer<'_> {
    let Some(raw) = headers.get(AUTHORIZATION) else {
        return Bearer::Absent;
    };
    raw.to_str()
        .ok()
        .and_then(|auth| {
            auth.strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
        })
        .map_or(Bearer::Malformed, Bearer::Token)
}

/// Resolves the caller from the `Authorization` header. Never fails: any problem is anonymous.
pub async fn resolve_viewer(state: &AppState, headers: &HeaderMap) -> Viewer {
    let token = match bearer_token(headers) {
        Bearer::Absent => return Viewer(None),
        Bearer::Malformed => {
            warn!("authorization header is not a bearer token");
            return Viewer(None);
        }
        Bearer::Token(token) => token,
    };

    match verify_session(state.users.as_ref(), &state.jwt, token).await {
        Ok(user_id) => {
            debug!(%user_id, "session resolved");
            Viewer(Some(user_id))
        }
        Err(SessionError::Lookup(e)) => {
            error!(error = ?e, "session lookup failed");
            Viewer(None)
        }
        Err(e) => {
            warn!(reason = %e, "session token rejected");
            Viewer(None)
        }
    }
}
