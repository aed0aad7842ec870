//! Video probing and normalization.

mod probe;
mod transcoder;

pub use probe::{VideoProbe, VideoProber};
pub use transcoder::{FfmpegTranscoder, ToolPaths, TranscodeOutcome, TARGET_CODEC};
