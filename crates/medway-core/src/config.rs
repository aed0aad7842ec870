//! Environment-driven configuration.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8230;
pub const DEFAULT_MAX_VIDEO_DURATION_SECS: f64 = 20.0;
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Process-wide configuration, loaded once at startup and read-only
/// afterwards. Transcoder tool paths are injected from here rather than
/// resolved ad hoc at call sites.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Root directory of the chunked blob store.
    pub store_root: PathBuf,
    /// Where multipart uploads are staged before ingestion.
    pub staging_dir: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Ceiling applied to video uploads when the request does not override it.
    pub max_video_duration_secs: f64,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_port: parse_or("MEDWAY_PORT", DEFAULT_PORT)?,
            store_root: PathBuf::from(env_or("MEDWAY_STORE_ROOT", "./data/blobs")),
            staging_dir: PathBuf::from(env_or("MEDWAY_STAGING_DIR", "./data/staging")),
            ffmpeg_path: env_or("MEDWAY_FFMPEG_PATH", "ffmpeg"),
            ffprobe_path: env_or("MEDWAY_FFPROBE_PATH", "ffprobe"),
            max_video_duration_secs: parse_or(
                "MEDWAY_MAX_VIDEO_DURATION_SECS",
                DEFAULT_MAX_VIDEO_DURATION_SECS,
            )?,
            max_body_bytes: parse_or("MEDWAY_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
