//! Extraction engine port.
//!
//! The engine is an opaque external job: given a URL and a writable
//! staging directory it produces (at most) one media file there. How it
//! does that - format selection, site handling, transcoding - is not this
//! crate's concern.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::download::DownloadResult;

/// One progress report from the running job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionProgress {
    /// Percent complete, `0.0..=100.0`. Zero or negative means unknown.
    pub percent: f32,
    /// Estimated seconds remaining; zero when unknown.
    pub eta_seconds: u64,
    /// The raw status line the engine printed, if any.
    pub line: Option<String>,
}

impl ExtractionProgress {
    /// Create a progress report.
    #[must_use]
    pub const fn new(percent: f32, eta_seconds: u64, line: Option<String>) -> Self {
        Self {
            percent,
            eta_seconds,
            line,
        }
    }

    /// Map the 0-100 percent linearly onto a `[0, 1]` fraction.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Progress callback handed to [`ExtractionEngine::extract`].
///
/// Fired serially from the engine's own task; it gates the engine's read
/// loop, so it must not block for long.
pub type ProgressFn<'a> = &'a (dyn Fn(ExtractionProgress) + Send + Sync);

/// Port for the external extraction job.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Run one extraction job against `url`, writing into `staging_dir`.
    ///
    /// Success carries no payload - the produced artifact is discovered
    /// separately by scanning the staging directory. A non-zero exit, an
    /// internal failure or an interrupt all map to
    /// [`DownloadError::Extraction`](crate::DownloadError::Extraction);
    /// there is no partial-success variant. The engine may leave a
    /// complete or partially-written file behind even on failure.
    async fn extract(
        &self,
        url: &str,
        staging_dir: &Path,
        on_progress: ProgressFn<'_>,
    ) -> DownloadResult<()>;
}
