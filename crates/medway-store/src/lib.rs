//! Chunked blob storage.
//!
//! Blobs live as a sequence of fixed-size chunk files plus a metadata
//! document written when the upload commits. Ids are allocated before the
//! first byte is written, so callers can reference a blob while it is
//! still streaming in.

mod chunked;
mod traits;

pub use chunked::{FsChunkStore, DEFAULT_CHUNK_SIZE};
pub use traits::{
    BlobId, BlobMetadata, BlobSink, BlobStore, ByteRange, ByteStream, StoreError, StoreResult,
    StoredBlob,
};
