//! Batch ingestion with per-item fault isolation.
//!
//! Each file is processed independently: a rejected, over-limit, or corrupt
//! file is logged and dropped from the result without affecting its
//! siblings. Every item's staged temp file is removed on every exit path,
//! and temp sweep failures never shadow the error that caused the exit.

use crate::error::{IngestError, TranscodeError};
use crate::sniff;
use crate::traits::Transcode;
use medway_core::PendingFile;
use medway_store::{BlobMetadata, BlobStore, StoredBlob};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncReadExt;

const UPLOAD_BUF_LEN: usize = 64 * 1024;
const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// A stored video together with its poster, when one was produced.
#[derive(Debug, Clone)]
pub struct StoredVideo {
    pub blob: StoredBlob,
    pub poster: Option<StoredBlob>,
}

pub struct IngestionPipeline {
    store: Arc<dyn BlobStore>,
    transcoder: Arc<dyn Transcode>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn BlobStore>, transcoder: Arc<dyn Transcode>) -> Self {
        Self { store, transcoder }
    }

    /// Sniff, validate, and store a batch of images.
    ///
    /// Files that are not recognizable images are a normal outcome, not a
    /// fault: deleted and omitted from the result. Store failures exclude
    /// the item too, but those are logged as failures.
    pub async fn ingest_images(&self, files: &[PendingFile]) -> Vec<StoredBlob> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match store_image(self.store.as_ref(), file).await {
                Ok(Some(blob)) => stored.push(blob),
                Ok(None) => {
                    tracing::debug!(file = %file.filename, "Rejected non-image upload");
                }
                Err(e) => {
                    tracing::warn!(error = %e, file = %file.filename, "Image ingestion failed");
                }
            }
        }
        stored
    }

    /// Transcode and store a batch of videos, one at a time.
    ///
    /// Every failure mode (duration cap, probe/encode/poster trouble, store
    /// errors) is a per-item fault: compensating cleanup runs, the item is
    /// dropped, the batch continues.
    pub async fn ingest_videos(
        &self,
        files: &[PendingFile],
        max_duration_secs: f64,
    ) -> Vec<StoredVideo> {
        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match self.ingest_video(file, max_duration_secs).await {
                Ok(video) => stored.push(video),
                Err(IngestError::Transcode(TranscodeError::LongVideo { max_secs })) => {
                    tracing::debug!(
                        file = %file.filename,
                        max_secs,
                        "Video over duration limit, skipped"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, file = %file.filename, "Video ingestion failed");
                }
            }
        }
        stored
    }

    async fn ingest_video(
        &self,
        file: &PendingFile,
        max_duration_secs: f64,
    ) -> Result<StoredVideo, IngestError> {
        let mut temps = TempFiles::default();
        temps.track(file.path.clone());

        let result = self
            .ingest_video_inner(file, max_duration_secs, &mut temps)
            .await;
        temps.sweep().await;
        result
    }

    async fn ingest_video_inner(
        &self,
        file: &PendingFile,
        max_duration_secs: f64,
        temps: &mut TempFiles,
    ) -> Result<StoredVideo, IngestError> {
        // The transcoder cleans up artifacts of a failed run itself; on
        // success, whatever it produced becomes this item's to sweep.
        let outcome = self.transcoder.transcode(file, max_duration_secs).await?;
        if outcome.video_path != file.path {
            temps.track(outcome.video_path.clone());
        }

        let metadata = BlobMetadata {
            content_type: Some(VIDEO_CONTENT_TYPE.to_string()),
            original_filename: Some(file.filename.clone()),
            poster_id: outcome.poster.as_ref().map(|p| p.id),
        };
        let blob =
            upload_from_path(self.store.as_ref(), &outcome.video_path, &file.filename, metadata)
                .await?;

        Ok(StoredVideo {
            blob,
            poster: outcome.poster,
        })
    }
}

/// Run one file through the image path: sniff, then stream into the store.
///
/// The temp file at `file.path` is removed on every exit, success or not.
/// `Ok(None)` means the content is not an accepted image format; that is a
/// normal outcome, distinct from read or store failures.
pub async fn store_image(
    store: &dyn BlobStore,
    file: &PendingFile,
) -> Result<Option<StoredBlob>, IngestError> {
    let mut temps = TempFiles::default();
    temps.track(file.path.clone());

    let result = store_image_inner(store, file).await;
    temps.sweep().await;
    result
}

async fn store_image_inner(
    store: &dyn BlobStore,
    file: &PendingFile,
) -> Result<Option<StoredBlob>, IngestError> {
    let ext = sniff::detect_extension(&file.path)
        .await
        .map_err(IngestError::Sniff)?;
    let ext = match ext {
        Some(ext) if sniff::is_allowed_image_ext(ext) => ext,
        _ => return Ok(None),
    };

    let metadata = BlobMetadata {
        content_type: Some(sniff::image_content_type(ext).to_string()),
        original_filename: Some(file.filename.clone()),
        poster_id: None,
    };
    let blob = upload_from_path(store, &file.path, &file.filename, metadata).await?;
    Ok(Some(blob))
}

/// Stream a staged file into the store in bounded reads. A failed read or
/// write aborts the upload so no half-open sink is left behind.
async fn upload_from_path(
    store: &dyn BlobStore,
    path: &Path,
    name: &str,
    metadata: BlobMetadata,
) -> Result<StoredBlob, IngestError> {
    let mut source = fs::File::open(path).await.map_err(IngestError::Read)?;
    let mut sink = store.begin_upload(name, metadata).await?;

    let mut buf = vec![0u8; UPLOAD_BUF_LEN];
    loop {
        let n = match source.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                sink.abort().await;
                return Err(IngestError::Read(e));
            }
        };
        if n == 0 {
            break;
        }
        if let Err(e) = sink.write(&buf[..n]).await {
            sink.abort().await;
            return Err(e.into());
        }
    }

    let blob = sink.finish().await?;
    tracing::info!(blob_id = %blob.id, name = %name, length = blob.length, "File stored");
    Ok(blob)
}

/// Temp paths owned by one ingestion item, swept once on every exit path.
#[derive(Default)]
struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    async fn sweep(&mut self) {
        for path in self.paths.drain(..) {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Failed to remove temp file")
                }
            }
        }
    }
}
