//! Source metadata probe.
//!
//! Runs `yt-dlp --dump-json` against a URL and extracts the fields a
//! caller can show before committing to a download. Not used by the
//! pipeline itself.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command;

use otter_core::download::{DownloadError, DownloadResult};

/// Metadata for a source URL, as reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Video title.
    pub title: String,
    /// Channel or account that published it.
    pub uploader: String,
    /// Duration in whole seconds; zero when the source does not report it.
    pub duration_seconds: u64,
    /// Thumbnail URL, possibly empty.
    pub thumbnail: String,
}

pub(crate) async fn inspect(binary: &Path, url: &str) -> DownloadResult<VideoInfo> {
    let output = Command::new(binary)
        .args(["--dump-json", "--no-playlist", url])
        .output()
        .await
        .map_err(|e| DownloadError::extraction(format!("failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        return Err(DownloadError::extraction(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    parse_video_info(&output.stdout)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_video_info(stdout: &[u8]) -> DownloadResult<VideoInfo> {
    let json: Value = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::extraction(format!("unparseable metadata: {e}")))?;

    Ok(VideoInfo {
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
        duration_seconds: json["duration"].as_f64().unwrap_or(0.0).max(0.0) as u64,
        thumbnail: json["thumbnail"].as_str().unwrap_or_default().to_string(),
    })
}
