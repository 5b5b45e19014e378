use async_graphql::{Context, ErrorExtensions, InputObject, Object, Result, Upload};

use super::{services, upload};
use crate::{auth::Viewer, state::AppState};

#[derive(InputObject)]
pub struct SingleFileInput {
    pub file: Upload,
}

#[derive(Default)]
pub struct FilesQuery;

#[Object]
impl FilesQuery {
    /// Signed, hour-long URLs for every file the caller has stored.
    async fn get_files(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::list_files(state, owner).await.map_err(|e| e.extend())
    }
}

#[derive(Default)]
pub struct FilesMutation;

#[Object]
impl FilesMutation {
    async fn single_upload(&self, ctx: &Context<'_>, input: SingleFileInput) -> Result<String> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let file = upload::read_upload(ctx, "file", &input.file, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        services::upload_file(state, owner, file)
            .await
            .map_err(|e| e.extend())
    }

    async fn multi_upload(&self, ctx: &Context<'_>, input: Vec<Upload>) -> Result<Vec<String>> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        let files = upload::read_all(ctx, "input", &input, &state.config.uploads)
            .await
            .map_err(|e| e.extend())?;
        services::upload_files(state, owner, files)
            .await
            .map_err(|e| e.extend())
    }

    async fn single_delete(&self, ctx: &Context<'_>, file_url: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let owner = Viewer::from_ctx(ctx).require().map_err(|e| e.extend())?;
        services::delete_file(state, owner, &file_url)
            .await
            .map_err(|e| e.extend())
    }
}
