//! yt-dlp subprocess adapter.
//!
//! Spawns the external extraction tool with a fixed argument contract,
//! streams its stdout for progress, and captures stderr for diagnostics.
//! The engine never cleans up after itself: partial files in the staging
//! directory are the staging area's problem.

mod probe;
mod progress;

pub use probe::VideoInfo;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use otter_core::download::{DownloadError, DownloadResult};
use otter_core::ports::{ExtractionEngine, ExtractionProgress, ProgressFn};

use progress::parse_progress_line;

/// Browser user-agent sent with every invocation; some source sites
/// reject the default client identifier.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Combined best video+audio in an mp4 container, with graduated
/// fallbacks for sources that cannot provide it.
const FORMAT_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Well-known install locations probed before falling back to `$PATH`.
const BINARY_CANDIDATES: &[&str] = &[
    "/opt/homebrew/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
];

/// The external extraction engine, driven over its CLI.
pub struct YtDlpEngine {
    binary: PathBuf,
}

impl YtDlpEngine {
    /// Locate the yt-dlp binary in well-known paths, then `$PATH`.
    ///
    /// Discovery never fails; a missing binary surfaces as a spawn error
    /// on the first job instead.
    #[must_use]
    pub fn discover() -> Self {
        for candidate in BINARY_CANDIDATES {
            let path = Path::new(candidate);
            if path.exists() {
                return Self {
                    binary: path.to_path_buf(),
                };
            }
        }
        let binary = which::which("yt-dlp").unwrap_or_else(|_| PathBuf::from("yt-dlp"));
        Self { binary }
    }

    /// Use an explicit binary path.
    #[must_use]
    pub const fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// The binary this engine will spawn.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The fixed invocation for one extraction job.
    ///
    /// Output template bound to the staging directory, mp4-preferring
    /// format selector, `--no-mtime` so the artifact sorts to the top of
    /// time-ordered views, `--newline` for line-buffered progress, and a
    /// realistic browser user-agent.
    fn download_args(url: &str, staging_dir: &Path) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("{}/%(title)s.%(ext)s", staging_dir.display()),
            "-f".to_string(),
            FORMAT_SELECTOR.to_string(),
            "--no-mtime".to_string(),
            "--newline".to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
            url.to_string(),
        ]
    }

    /// Report the installed engine version (`yt-dlp --version`).
    pub async fn version(&self) -> DownloadResult<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                DownloadError::extraction(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;
        if !output.status.success() {
            return Err(DownloadError::extraction(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Fetch source metadata without downloading (`--dump-json`).
    pub async fn inspect(&self, url: &str) -> DownloadResult<VideoInfo> {
        probe::inspect(&self.binary, url).await
    }
}

#[async_trait]
impl ExtractionEngine for YtDlpEngine {
    async fn extract(
        &self,
        url: &str,
        staging_dir: &Path,
        on_progress: ProgressFn<'_>,
    ) -> DownloadResult<()> {
        match self.version().await {
            Ok(version) => tracing::debug!(%version, "yt-dlp version"),
            Err(e) => tracing::warn!(error = %e, "Could not determine yt-dlp version"),
        }

        let args = Self::download_args(url, staging_dir);
        tracing::info!(url = %url, binary = %self.binary.display(), "Starting extraction job");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::extraction(format!("failed to spawn yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::extraction("missing stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::extraction("missing stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let mut reader = BufReader::new(stderr);
            let _ = reader.read_to_end(&mut buf).await;
            buf
        });

        // The callback gates this read loop, so it must stay cheap.
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| DownloadError::extraction(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parse_progress_line(&line);
            on_progress(ExtractionProgress {
                percent: parsed.map_or(0.0, |p| p.percent),
                eta_seconds: parsed.map_or(0, |p| p.eta_seconds),
                line: Some(line),
            });
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::extraction(e.to_string()))?;
        let stderr_buf = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(DownloadError::extraction(diagnostic_tail(
                &stderr_buf,
                &status,
            )));
        }
        Ok(())
    }
}

/// Condense subprocess stderr into a short diagnostic: prefer `ERROR:`
/// lines, otherwise the last few non-empty ones.
fn diagnostic_tail(stderr: &[u8], status: &std::process::ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let mut lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return format!("yt-dlp exited with {status}");
    }

    let errors: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("ERROR:"))
        .collect();
    if !errors.is_empty() {
        return errors.join(" | ");
    }

    let tail = lines.split_off(lines.len().saturating_sub(3));
    tail.join(" | ")
}
