use crate::error::TranscodeError;
use crate::video::TranscodeOutcome;
use async_trait::async_trait;
use medway_core::PendingFile;

/// Seam for the video transcode stage so the pipeline can be exercised
/// without a real ffmpeg binary.
#[async_trait]
pub trait Transcode: Send + Sync {
    /// Probe, gate on duration, normalize the container/codec if needed,
    /// and produce a poster when a re-encode happened.
    ///
    /// Implementations clean up only artifacts they created; the original
    /// `file` temp belongs to the caller.
    async fn transcode(
        &self,
        file: &PendingFile,
        max_duration_secs: f64,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}
