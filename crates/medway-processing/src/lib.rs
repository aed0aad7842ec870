//! Media ingestion: content-type sniffing, video normalization, and the
//! batch pipeline that ties them to the blob store.

pub mod error;
pub mod pipeline;
pub mod sniff;
pub mod traits;
pub mod video;

pub use error::{IngestError, TranscodeError};
pub use pipeline::{store_image, IngestionPipeline, StoredVideo};
pub use traits::Transcode;
pub use video::{FfmpegTranscoder, ToolPaths, TranscodeOutcome};
