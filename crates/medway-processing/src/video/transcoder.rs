//! ffmpeg-driven normalization to mp4/h264, plus poster extraction.

use crate::error::TranscodeError;
use crate::pipeline;
use crate::traits::Transcode;
use crate::video::probe::{validate_tool_path, VideoProbe, VideoProber};
use async_trait::async_trait;
use medway_core::PendingFile;
use medway_store::{BlobStore, StoredBlob};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Videos already in this codec are passed through untouched.
pub const TARGET_CODEC: &str = "h264";
const TARGET_EXT: &str = "mp4";
const POSTER_EXT: &str = "png";
/// The poster frame is taken this far into the video.
const POSTER_POSITION: f64 = 0.25;

/// Paths to the external tools, injected at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
}

/// Result of one transcode job. The video path equals the input path when
/// the source codec already matched and nothing was re-encoded; the poster
/// exists only when a re-encode happened.
#[derive(Debug, Clone)]
pub struct TranscodeOutcome {
    pub video_path: PathBuf,
    pub poster: Option<StoredBlob>,
}

enum Plan {
    PassThrough,
    Reencode,
}

/// Duration gate and codec check, separated from the subprocess plumbing.
fn plan(probe: &VideoProbe, max_duration_secs: f64) -> Result<Plan, TranscodeError> {
    if probe.duration_secs > max_duration_secs {
        return Err(TranscodeError::LongVideo {
            max_secs: max_duration_secs,
        });
    }
    if probe.codec == TARGET_CODEC {
        Ok(Plan::PassThrough)
    } else {
        Ok(Plan::Reencode)
    }
}

pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    prober: VideoProber,
    store: Arc<dyn BlobStore>,
}

impl FfmpegTranscoder {
    pub fn new(tools: ToolPaths, store: Arc<dyn BlobStore>) -> Result<Self, TranscodeError> {
        validate_tool_path(&tools.ffmpeg)?;
        let prober = VideoProber::new(tools.ffprobe)?;
        Ok(Self {
            ffmpeg_path: tools.ffmpeg,
            prober,
            store,
        })
    }

    async fn reencode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let result = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .args(["-f", TARGET_EXT, "-c:v", "libx264", "-preset", "ultrafast", "-y"])
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscodeError::Encode(format!("failed to execute ffmpeg: {}", e)))?;

        if !result.status.success() {
            remove_partial(output).await;
            return Err(TranscodeError::Encode(
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ));
        }
        Ok(())
    }

    async fn extract_poster(
        &self,
        video: &Path,
        poster: &Path,
        duration_secs: f64,
    ) -> Result<(), TranscodeError> {
        let timestamp = duration_secs * POSTER_POSITION;
        let result = Command::new(&self.ffmpeg_path)
            .args(["-ss", &format!("{:.3}", timestamp)])
            .arg("-i")
            .arg(video)
            .args(["-vframes", "1", "-y"])
            .arg(poster)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscodeError::Poster(format!("failed to execute ffmpeg: {}", e)))?;

        if !result.status.success() {
            remove_partial(poster).await;
            return Err(TranscodeError::Poster(
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Transcode for FfmpegTranscoder {
    async fn transcode(
        &self,
        file: &PendingFile,
        max_duration_secs: f64,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let probe = self.prober.probe(&file.path).await?;

        match plan(&probe, max_duration_secs)? {
            Plan::PassThrough => {
                tracing::debug!(
                    file = %file.filename,
                    codec = %probe.codec,
                    "Codec already matches target, skipping re-encode"
                );
                Ok(TranscodeOutcome {
                    video_path: file.path.clone(),
                    poster: None,
                })
            }
            Plan::Reencode => {
                let output = derived_path(&file.path, TARGET_EXT);
                self.reencode(&file.path, &output).await?;

                let poster_path = derived_path(&output, POSTER_EXT);
                if let Err(e) = self
                    .extract_poster(&output, &poster_path, probe.duration_secs)
                    .await
                {
                    remove_partial(&output).await;
                    return Err(e);
                }

                let poster_file = match pending_poster(&poster_path, &file.filename).await {
                    Ok(f) => f,
                    Err(e) => {
                        remove_partial(&poster_path).await;
                        remove_partial(&output).await;
                        return Err(TranscodeError::Poster(e.to_string()));
                    }
                };

                // store_image consumes the poster temp file on every path.
                let poster = match pipeline::store_image(self.store.as_ref(), &poster_file).await {
                    Ok(Some(blob)) => blob,
                    Ok(None) => {
                        remove_partial(&output).await;
                        return Err(TranscodeError::Poster(
                            "extracted frame was not a recognizable image".to_string(),
                        ));
                    }
                    Err(e) => {
                        remove_partial(&output).await;
                        return Err(TranscodeError::PosterStore(e.to_string()));
                    }
                };

                tracing::info!(
                    file = %file.filename,
                    duration_secs = probe.duration_secs,
                    source_codec = %probe.codec,
                    poster_id = %poster.id,
                    "Video normalized"
                );

                Ok(TranscodeOutcome {
                    video_path: output,
                    poster: Some(poster),
                })
            }
        }
    }
}

/// Best-effort removal of a partially written artifact. Never allowed to
/// shadow the error that triggered it.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial output")
        }
    }
}

/// `<base>.<ext>`, keeping whatever extension `base` already had.
fn derived_path(base: &Path, ext: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

async fn pending_poster(path: &Path, source_filename: &str) -> std::io::Result<PendingFile> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(PendingFile {
        path: path.to_path_buf(),
        filename: format!("{}.{}", source_filename, POSTER_EXT),
        size: meta.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(duration_secs: f64, codec: &str) -> VideoProbe {
        VideoProbe {
            duration_secs,
            codec: codec.to_string(),
        }
    }

    #[test]
    fn test_plan_rejects_long_video_before_any_work() {
        match plan(&probe(21.0, "vp9"), 20.0) {
            Err(TranscodeError::LongVideo { max_secs }) => assert_eq!(max_secs, 20.0),
            other => panic!("expected LongVideo, got {:?}", other.err()),
        }
        // Exactly at the limit is fine.
        assert!(plan(&probe(20.0, "vp9"), 20.0).is_ok());
    }

    #[test]
    fn test_plan_passes_matching_codec_through() {
        assert!(matches!(
            plan(&probe(5.0, "h264"), 20.0),
            Ok(Plan::PassThrough)
        ));
        assert!(matches!(plan(&probe(5.0, "vp9"), 20.0), Ok(Plan::Reencode)));
        assert!(matches!(
            plan(&probe(5.0, "mpeg4"), 20.0),
            Ok(Plan::Reencode)
        ));
    }

    #[test]
    fn test_derived_path_appends_extension() {
        assert_eq!(
            derived_path(Path::new("/tmp/upload-abc.mov"), "mp4"),
            PathBuf::from("/tmp/upload-abc.mov.mp4")
        );
        assert_eq!(
            derived_path(Path::new("/tmp/upload-abc.mov.mp4"), "png"),
            PathBuf::from("/tmp/upload-abc.mov.mp4.png")
        );
    }
}
