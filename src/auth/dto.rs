use async_graphql::SimpleObject;

use super::{repo_types::User, services::Session};

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "User")]
pub struct UserView {
    pub id: String,
    pub username: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserView,
}

impl From<Session> for AuthPayload {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}
