use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque store-assigned blob identifier. Unique, comparable, and stable
/// under serialization; nothing outside this crate depends on its
/// representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlobId(Uuid);

impl BlobId {
    pub(crate) fn generate() -> Self {
        BlobId(Uuid::new_v4())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for BlobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BlobId(Uuid::parse_str(s)?))
    }
}

/// A single requested byte window of a stored blob.
///
/// `0 <= start <= end < total` holds for every constructed value; anything
/// else is rejected here, before any store read happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
    total: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64, total: u64) -> StoreResult<Self> {
        if start > end || end >= total {
            return Err(StoreError::InvalidRange { start, end, total });
        }
        Ok(ByteRange { start, end, total })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of bytes in the window. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// User-supplied metadata persisted with a blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub content_type: Option<String>,
    pub original_filename: Option<String>,
    /// For stored videos: the blob holding the poster frame.
    pub poster_id: Option<BlobId>,
}

/// A committed blob. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBlob {
    pub id: BlobId,
    pub filename: String,
    pub length: u64,
    pub metadata: BlobMetadata,
    pub uploaded_at: DateTime<Utc>,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob {0} not found")]
    NotFound(BlobId),
    #[error("invalid byte range {start}-{end}/{total}")]
    InvalidRange { start: u64, end: u64, total: u64 },
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("corrupt blob metadata: {0}")]
    CorruptMetadata(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Byte stream handed to download callers. Chunks are read lazily, one per
/// poll, so a slow consumer never forces the whole blob into memory.
pub type ByteStream = Pin<Box<dyn Stream<Item = StoreResult<Bytes>> + Send>>;

/// Writable end of an in-flight upload.
///
/// The id is available before the first write. Dropping a sink without
/// calling `finish` leaves uncommitted chunks behind (no transactional
/// guarantee); `abort` removes them best-effort.
#[async_trait]
pub trait BlobSink: Send {
    fn id(&self) -> BlobId;

    async fn write(&mut self, data: &[u8]) -> StoreResult<()>;

    /// Commit the upload and return the finalized blob.
    async fn finish(self: Box<Self>) -> StoreResult<StoredBlob>;

    /// Best-effort removal of everything written so far.
    async fn abort(self: Box<Self>);
}

/// Chunked blob storage capability consumed by the ingestion pipeline and
/// the streaming handlers. There is deliberately no delete operation in
/// this surface: cleanup only ever targets local temp files, never
/// committed blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn begin_upload(
        &self,
        name: &str,
        metadata: BlobMetadata,
    ) -> StoreResult<Box<dyn BlobSink>>;

    async fn find(&self, id: BlobId) -> StoreResult<Option<StoredBlob>>;

    /// Open a byte source over the blob, optionally restricted to `range`.
    async fn open_download(
        &self,
        id: BlobId,
        range: Option<ByteRange>,
    ) -> StoreResult<ByteStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_invariant() {
        assert!(ByteRange::new(0, 99, 1000).is_ok());
        assert!(ByteRange::new(999, 999, 1000).is_ok());
        assert!(ByteRange::new(0, 1000, 1000).is_err());
        assert!(ByteRange::new(50, 49, 1000).is_err());
        assert!(ByteRange::new(0, 0, 0).is_err());
    }

    #[test]
    fn test_byte_range_len() {
        let range = ByteRange::new(0, 99, 1000).unwrap();
        assert_eq!(range.len(), 100);
        let range = ByteRange::new(10, 10, 1000).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_blob_id_round_trips_as_string() {
        let id = BlobId::generate();
        let parsed: BlobId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<BlobId>().is_err());
    }
}
