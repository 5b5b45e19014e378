use async_graphql::{Context, ErrorExtensions, Object, Result};

use super::{
    dto::{AuthPayload, UserView},
    services,
    session::Viewer,
};
use crate::state::AppState;

#[derive(Default)]
pub struct AuthQuery;

#[Object]
impl AuthQuery {
    /// The authenticated caller, or `null`.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserView>> {
        let state = ctx.data::<AppState>()?;
        let viewer = Viewer::from_ctx(ctx);
        let user = services::me(state, viewer.0).await.map_err(|e| e.extend())?;
        Ok(user.map(UserView::from))
    }
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    async fn signup(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<AuthPayload> {
        let state = ctx.data::<AppState>()?;
        let session = services::signup(state, &username, &password)
            .await
            .map_err(|e| e.extend())?;
        Ok(session.into())
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<AuthPayload> {
        let state = ctx.data::<AppState>()?;
        let session = services::login(state, &username, &password)
            .await
            .map_err(|e| e.extend())?;
        Ok(session.into())
    }

    /// Revokes every token issued to the caller so far.
    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let user_id = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::logout(state, user_id).await.map_err(|e| e.extend())
    }
}
