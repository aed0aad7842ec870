//! ffprobe wrapper.

use crate::error::TranscodeError;
use std::path::Path;
use tokio::process::Command;

/// Container-level facts ffprobe reports about a video file.
#[derive(Debug, Clone)]
pub struct VideoProbe {
    pub duration_secs: f64,
    pub codec: String,
}

#[derive(Debug, Clone)]
pub struct VideoProber {
    ffprobe_path: String,
}

impl VideoProber {
    pub fn new(ffprobe_path: String) -> Result<Self, TranscodeError> {
        validate_tool_path(&ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }

    #[tracing::instrument(skip(self), fields(ffmpeg.operation = "probe"))]
    pub async fn probe(&self, video_path: &Path) -> Result<VideoProbe, TranscodeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(video_path)
            .output()
            .await
            .map_err(|e| TranscodeError::Probe(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(TranscodeError::Probe(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let data: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| TranscodeError::Probe(format!("unparseable ffprobe output: {}", e)))?;

        let probe = parse_probe(&data)?;
        tracing::debug!(
            duration_secs = probe.duration_secs,
            codec = %probe.codec,
            "Video probe completed"
        );
        Ok(probe)
    }
}

/// ffprobe reports duration as a decimal string under `format`; the codec
/// comes from the first (selected) video stream.
fn parse_probe(data: &serde_json::Value) -> Result<VideoProbe, TranscodeError> {
    let duration_secs = data["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| TranscodeError::Probe("missing or unparseable duration".to_string()))?;

    let codec = data["streams"]
        .get(0)
        .and_then(|s| s["codec_name"].as_str())
        .ok_or_else(|| TranscodeError::Probe("no video stream found".to_string()))?
        .to_string();

    Ok(VideoProbe {
        duration_secs,
        codec,
    })
}

/// Tool paths come from configuration and are handed straight to the
/// process spawner, so shell metacharacters are rejected outright.
pub(crate) fn validate_tool_path(path: &str) -> Result<(), TranscodeError> {
    let dangerous = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous.contains(&c)) {
        return Err(TranscodeError::Config(format!(
            "unusable tool path: {:?}",
            path
        )));
    }
    Ok(())
}
