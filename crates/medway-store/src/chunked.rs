//! Filesystem-backed chunked blob store.
//!
//! Layout per blob: `<root>/<id>/chunks/<n>` holds fixed-size chunk files,
//! `<root>/<id>/meta.json` is the metadata document. The metadata document
//! is written last: its presence is what makes a blob visible, so a crashed
//! or aborted upload is an invisible orphan rather than a truncated blob.
//! Orphan reaping is an external concern and nothing here precludes it.

use crate::traits::{
    BlobId, BlobMetadata, BlobSink, BlobStore, ByteRange, ByteStream, StoreError, StoreResult,
    StoredBlob,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default chunk size, matching the classic GridFS default.
pub const DEFAULT_CHUNK_SIZE: u64 = 255 * 1024;

const META_FILE: &str = "meta.json";
const CHUNKS_DIR: &str = "chunks";

#[derive(Debug, Clone)]
pub struct FsChunkStore {
    root: PathBuf,
    chunk_size: u64,
}

/// On-disk metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobRecord {
    id: BlobId,
    filename: String,
    length: u64,
    chunk_size: u64,
    uploaded_at: DateTime<Utc>,
    metadata: BlobMetadata,
}

impl From<BlobRecord> for StoredBlob {
    fn from(record: BlobRecord) -> Self {
        StoredBlob {
            id: record.id,
            filename: record.filename,
            length: record.length,
            metadata: record.metadata,
            uploaded_at: record.uploaded_at,
        }
    }
}

impl FsChunkStore {
    pub async fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_chunk_size(root, DEFAULT_CHUNK_SIZE).await
    }

    pub async fn with_chunk_size(root: impl Into<PathBuf>, chunk_size: u64) -> StoreResult<Self> {
        if chunk_size == 0 {
            return Err(StoreError::UploadFailed(
                "chunk size must be non-zero".to_string(),
            ));
        }
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(FsChunkStore { root, chunk_size })
    }

    fn blob_dir(&self, id: BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn chunk_path(dir: &Path, index: u64) -> PathBuf {
        dir.join(CHUNKS_DIR).join(format!("{:06}", index))
    }

    async fn load_record(&self, id: BlobId) -> StoreResult<Option<BlobRecord>> {
        let path = self.blob_dir(id).join(META_FILE);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_slice(&raw)
            .map_err(|e| StoreError::CorruptMetadata(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record))
    }
}

#[async_trait]
impl BlobStore for FsChunkStore {
    async fn begin_upload(
        &self,
        name: &str,
        metadata: BlobMetadata,
    ) -> StoreResult<Box<dyn BlobSink>> {
        let id = BlobId::generate();
        let dir = self.blob_dir(id);
        fs::create_dir_all(dir.join(CHUNKS_DIR)).await.map_err(|e| {
            tracing::error!(error = %e, blob_id = %id, "Failed to allocate blob directory");
            StoreError::UploadFailed(e.to_string())
        })?;

        Ok(Box::new(FsBlobSink {
            id,
            dir,
            chunk_size: self.chunk_size,
            filename: name.to_string(),
            metadata,
            buf: Vec::with_capacity(self.chunk_size as usize),
            next_chunk: 0,
            length: 0,
        }))
    }

    async fn find(&self, id: BlobId) -> StoreResult<Option<StoredBlob>> {
        Ok(self.load_record(id).await?.map(StoredBlob::from))
    }

    async fn open_download(
        &self,
        id: BlobId,
        range: Option<ByteRange>,
    ) -> StoreResult<ByteStream> {
        let record = self
            .load_record(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        // A range built against a stale total is rejected before any read.
        if let Some(range) = &range {
            if range.total() != record.length {
                return Err(StoreError::InvalidRange {
                    start: range.start(),
                    end: range.end(),
                    total: record.length,
                });
            }
        }

        let (offset, end) = match range {
            Some(r) => (r.start(), r.end() + 1),
            None => (0, record.length),
        };

        let dir = self.blob_dir(id);
        let chunk_size = record.chunk_size;

        let chunks = stream::try_unfold(offset, move |pos| {
            let dir = dir.clone();
            async move {
                if pos >= end {
                    return Ok(None);
                }
                let index = pos / chunk_size;
                let within = (pos % chunk_size) as usize;
                let path = FsChunkStore::chunk_path(&dir, index);
                let data = fs::read(&path).await.map_err(|e| {
                    StoreError::DownloadFailed(format!("chunk {}: {}", index, e))
                })?;
                let available = data.len().saturating_sub(within);
                let take = ((end - pos) as usize).min(available);
                if take == 0 {
                    return Err(StoreError::DownloadFailed(format!(
                        "chunk {} shorter than expected",
                        index
                    )));
                }
                let bytes = Bytes::copy_from_slice(&data[within..within + take]);
                Ok(Some((bytes, pos + take as u64)))
            }
        });

        Ok(Box::pin(chunks))
    }
}

struct FsBlobSink {
    id: BlobId,
    dir: PathBuf,
    chunk_size: u64,
    filename: String,
    metadata: BlobMetadata,
    buf: Vec<u8>,
    next_chunk: u64,
    length: u64,
}

impl FsBlobSink {
    async fn flush_chunk(&mut self) -> StoreResult<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let path = FsChunkStore::chunk_path(&self.dir, self.next_chunk);
        fs::write(&path, &self.buf).await.map_err(|e| {
            StoreError::UploadFailed(format!("chunk {}: {}", self.next_chunk, e))
        })?;
        self.next_chunk += 1;
        self.buf.clear();
        Ok(())
    }
}

#[async_trait]
impl BlobSink for FsBlobSink {
    fn id(&self) -> BlobId {
        self.id
    }

    async fn write(&mut self, mut data: &[u8]) -> StoreResult<()> {
        self.length += data.len() as u64;
        while !data.is_empty() {
            let room = self.chunk_size as usize - self.buf.len();
            let take = room.min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == self.chunk_size as usize {
                self.flush_chunk().await?;
            }
        }
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StoreResult<StoredBlob> {
        self.flush_chunk().await?;

        let record = BlobRecord {
            id: self.id,
            filename: self.filename.clone(),
            length: self.length,
            chunk_size: self.chunk_size,
            uploaded_at: Utc::now(),
            metadata: self.metadata.clone(),
        };
        let raw = serde_json::to_vec(&record)
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;
        fs::write(self.dir.join(META_FILE), raw)
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;

        tracing::info!(
            blob_id = %self.id,
            length = record.length,
            chunks = self.next_chunk,
            "Blob committed"
        );

        Ok(StoredBlob::from(record))
    }

    async fn abort(self: Box<Self>) {
        if let Err(e) = fs::remove_dir_all(&self.dir).await {
            tracing::warn!(error = %e, blob_id = %self.id, "Failed to remove aborted upload");
        }
    }
}
