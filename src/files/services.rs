use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{owner_of_key, unique_name, IncomingFile};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn list_files(state: &AppState, owner: Uuid) -> ApiResult<Vec<String>> {
    state
        .files
        .list_for_owner(owner)
        .await
        .map_err(ApiError::Storage)
}

#[instrument(skip(state, file), fields(filename = %file.filename))]
pub async fn upload_file(state: &AppState, owner: Uuid, file: IncomingFile) -> ApiResult<String> {
    let stored = state
        .files
        .store(owner, &unique_name(&file.filename), file.body, &file.content_type)
        .await
        .map_err(ApiError::Storage)?;
    info!(%owner, key = %stored.key, "file uploaded");
    Ok(stored.url)
}

/// Uploads in order; the first failure aborts the rest.
pub async fn upload_files(
    state: &AppState,
    owner: Uuid,
    files: Vec<IncomingFile>,
) -> ApiResult<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        urls.push(upload_file(state, owner, file).await?);
    }
    Ok(urls)
}

/// Foreign URLs are a no-op (`false`); another owner's object is forbidden.
#[instrument(skip(state))]
pub async fn delete_file(state: &AppState, owner: Uuid, url: &str) -> ApiResult<bool> {
    if let Some(key) = state.files.key_from_url(url) {
        if owner_of_key(&key) != Some(owner) {
            warn!(%owner, %key, "refusing to delete another owner's file");
            return Err(ApiError::Forbidden);
        }
    }
    let removed = state.files.remove(url).await.map_err(ApiError::Storage)?;
    if removed {
        info!(%owner, "file deleted");
    }
    Ok(removed)
}
