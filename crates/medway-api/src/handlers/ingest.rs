//! Batch upload endpoints.
//!
//! Both endpoints are fault-isolated per file: a bad, over-limit, or
//! corrupt file never fails the batch. Only a malformed batch body itself
//! is a request-level error.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use medway_core::{AppError, PendingFile};
use medway_processing::StoredVideo;
use medway_store::StoredBlob;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Descriptor returned for each stored file.
#[derive(Debug, Serialize, ToSchema)]
pub struct MediaResponse {
    pub id: String,
    pub filename: String,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl From<StoredBlob> for MediaResponse {
    fn from(blob: StoredBlob) -> Self {
        MediaResponse {
            id: blob.id.to_string(),
            filename: blob.filename,
            length: blob.length,
            content_type: blob.metadata.content_type,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    #[serde(flatten)]
    pub media: MediaResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<MediaResponse>,
}

impl From<StoredVideo> for VideoResponse {
    fn from(video: StoredVideo) -> Self {
        VideoResponse {
            media: MediaResponse::from(video.blob),
            poster: video.poster.map(MediaResponse::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VideoIngestQuery {
    pub max_duration_secs: Option<f64>,
}

#[utoipa::path(
    post,
    path = "/api/v0/images",
    tag = "media",
    responses(
        (status = 200, description = "Descriptors of accepted images; rejected files are omitted silently", body = [MediaResponse]),
        (status = 400, description = "Malformed multipart body", body = ErrorResponse)
    )
)]
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Vec<MediaResponse>>, HttpAppError> {
    let files = stage_files(&state, multipart).await?;
    let stored = state.pipeline.ingest_images(&files).await;
    Ok(Json(stored.into_iter().map(MediaResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "media",
    params(
        ("max_duration_secs" = Option<f64>, Query, description = "Per-request duration ceiling; defaults to the configured limit")
    ),
    responses(
        (status = 200, description = "Descriptors of stored videos; over-limit or failed items are omitted silently", body = [VideoResponse]),
        (status = 400, description = "Malformed multipart body or duration parameter", body = ErrorResponse)
    )
)]
pub async fn upload_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VideoIngestQuery>,
    multipart: Multipart,
) -> Result<Json<Vec<VideoResponse>>, HttpAppError> {
    let max = query
        .max_duration_secs
        .unwrap_or(state.config.max_video_duration_secs);
    if !max.is_finite() || max <= 0.0 {
        return Err(HttpAppError(AppError::BadRequest(
            "max_duration_secs must be a positive number".to_string(),
        )));
    }

    let files = stage_files(&state, multipart).await?;
    let stored = state.pipeline.ingest_videos(&files, max).await;
    Ok(Json(stored.into_iter().map(VideoResponse::from).collect()))
}

/// Stream every `file` field of the multipart body to the staging
/// directory. A malformed body is a batch-level fault: anything already
/// staged is removed before the error propagates.
async fn stage_files(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Vec<PendingFile>, HttpAppError> {
    fs::create_dir_all(&state.config.staging_dir)
        .await
        .map_err(|e| {
            HttpAppError(AppError::Internal(format!(
                "staging directory unavailable: {}",
                e
            )))
        })?;

    let mut staged: Vec<PendingFile> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard_staged(&staged).await;
                return Err(HttpAppError(AppError::BadRequest(format!(
                    "failed to read multipart body: {}",
                    e
                ))));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let path = state
            .config
            .staging_dir
            .join(format!("{}-{}", Uuid::new_v4(), sanitize_filename(&filename)));

        match stage_field(field, &path).await {
            Ok(size) => staged.push(PendingFile {
                path,
                filename,
                size,
            }),
            Err(e) => {
                remove_quietly(&path).await;
                discard_staged(&staged).await;
                return Err(HttpAppError(AppError::BadRequest(format!(
                    "failed to read file data: {}",
                    e
                ))));
            }
        }
    }

    Ok(staged)
}

async fn stage_field(mut field: Field<'_>, path: &Path) -> anyhow::Result<u64> {
    let mut out = fs::File::create(path).await?;
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(size)
}

fn sanitize_filename(name: &str) -> String {
    let base: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(120)
        .collect();
    if base.trim_matches(|c: char| c == '_' || c == '.').is_empty() {
        "upload".to_string()
    } else {
        base
    }
}

async fn discard_staged(staged: &[PendingFile]) {
    for file in staged {
        remove_quietly(&file.path).await;
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove staged file")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("holiday.mp4"), "holiday.mp4");
        assert_eq!(sanitize_filename("my file (1).png"), "my_file__1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename("..."), "upload");
    }
}
