use async_graphql::{http::GraphiQLSource, EmptySubscription, MergedObject, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse},
    Extension,
};

use crate::{
    auth::{resolve_viewer, AuthMutation, AuthQuery},
    files::handlers::{FilesMutation, FilesQuery},
    portfolio::{PortfolioMutation, PortfolioQuery},
    state::AppState,
};

#[derive(MergedObject, Default)]
pub struct QueryRoot(AuthQuery, FilesQuery, PortfolioQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutation, FilesMutation, PortfolioMutation);

pub type PortfolioSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: AppState) -> PortfolioSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(state)
    .finish()
}

/// Resolves the caller once per request and hands it to every resolver.
pub async fn graphql_handler(
    State(state): State<AppState>,
    Extension(schema): Extension<PortfolioSchema>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let viewer = resolve_viewer(&state, &headers).await;
    schema.execute(req.into_inner().data(viewer)).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
