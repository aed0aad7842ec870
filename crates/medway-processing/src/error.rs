use medway_store::StoreError;
use thiserror::Error;

/// Failures inside the video transcode stage.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Probed duration exceeds the configured ceiling. Carries the limit so
    /// callers can report it; no re-encode is attempted, no bytes produced.
    #[error("video too long, max duration is {max_secs} seconds")]
    LongVideo { max_secs: f64 },
    #[error("invalid transcoder configuration: {0}")]
    Config(String),
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("re-encode failed: {0}")]
    Encode(String),
    #[error("poster frame extraction failed: {0}")]
    Poster(String),
    #[error("poster upload failed: {0}")]
    PosterStore(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-item ingestion failure. Contained at the batch boundary: logged,
/// the item excluded, siblings unaffected.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The staged file could not be inspected. Distinct from "not an
    /// image", which is a normal outcome and not an error at all.
    #[error("could not inspect file contents: {0}")]
    Sniff(#[source] std::io::Error),
    #[error("could not read staged file: {0}")]
    Read(#[source] std::io::Error),
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error("blob store failure: {0}")]
    Store(#[from] StoreError),
}
