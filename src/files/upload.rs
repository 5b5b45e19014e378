use std::io::Read;

use anyhow::Context as _;
use async_graphql::{Context, Upload};
use bytes::Bytes;
use tracing::{debug, warn};

use super::IncomingFile;
use crate::{
    config::UploadConfig,
    error::{ApiError, ApiResult},
};

const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

fn content_type_from_extension(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    let content_type = match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(content_type)
}

/// Checks size and type. Returns the content type to store the object with.
pub fn validate_upload(
    field: &str,
    filename: &str,
    declared: Option<&str>,
    size: u64,
    cfg: &UploadConfig,
) -> ApiResult<String> {
    if size > cfg.max_bytes as u64 {
        warn!(field, filename, size, max = cfg.max_bytes, "upload too large");
        return Err(ApiError::validation(
            field,
            format!("file exceeds {} bytes", cfg.max_bytes),
        ));
    }

    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != GENERIC_CONTENT_TYPE);
    let content_type = declared
        .or_else(|| content_type_from_extension(filename).map(str::to_string))
        .ok_or_else(|| ApiError::validation(field, "unknown file type"))?;

    if !cfg.allowed_content_types.iter().any(|t| *t == content_type) {
        warn!(field, filename, %content_type, "upload type rejected");
        return Err(ApiError::validation(
            field,
            format!("file type {content_type} is not accepted"),
        ));
    }
    Ok(content_type)
}

/// Pulls an uploaded file out of the multipart request and validates it.
pub async fn read_upload(
    ctx: &Context<'_>,
    field: &str,
    upload: &Upload,
    cfg: &UploadConfig,
) -> ApiResult<IncomingFile> {
    let value = upload
        .value(ctx)
        .map_err(|e| ApiError::validation(field, format!("unreadable upload: {e}")))?;
    let size = value
        .size()
        .map_err(|e| ApiError::validation(field, format!("unreadable upload: {e}")))?;
    let content_type = validate_upload(
        field,
        &value.filename,
        value.content_type.as_deref(),
        size,
        cfg,
    )?;
    let filename = value.filename.clone();

    let body = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(size as usize);
        value
            .into_read()
            .read_to_end(&mut buf)
            .context("read upload body")?;
        Ok(buf)
    })
    .await
    .context("join upload reader")
    .and_then(|read| read)
    .map_err(ApiError::Storage)?;

    debug!(field, %filename, %content_type, size, "upload received");
    Ok(IncomingFile {
        filename,
        content_type,
        body: Bytes::from(body),
    })
}

pub async fn read_optional(
    ctx: &Context<'_>,
    field: &str,
    upload: Option<&Upload>,
    cfg: &UploadConfig,
) -> ApiResult<Option<IncomingFile>> {
    match upload {
        Some(upload) => read_upload(ctx, field, upload, cfg).await.map(Some),
        None => Ok(None),
    }
}

pub async fn read_all(
    ctx: &Context<'_>,
    field: &str,
    uploads: &[Upload],
    cfg: &UploadConfig,
) -> ApiResult<Vec<IncomingFile>> {
    let mut files = Vec::with_capacity(uploads.len());
    for upload in uploads {
        files.push(read_upload(ctx, field, upload, cfg).await?);
    }
    Ok(files)
}
