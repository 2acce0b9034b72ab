//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default relative placement inside the media collection.
pub const DEFAULT_COLLECTION_PATH: &str = "Movies/otter";

/// MIME type published artifacts are reserved with.
pub const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Configuration for the download pipeline.
///
/// Contains the paths and pacing the orchestrator needs. Engine-specific
/// options are handled by the engine adapter.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Private scratch directory the engine writes into. One directory is
    /// reused across jobs; there are no per-job subdirectories.
    pub staging_directory: PathBuf,
    /// Relative placement path inside the media collection.
    pub collection_path: String,
    /// MIME type for published records.
    pub mime_type: String,
    /// Display delay between the `Complete` and `Settled` status updates.
    pub settle_delay: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            staging_directory: PathBuf::from("."),
            collection_path: DEFAULT_COLLECTION_PATH.to_string(),
            mime_type: VIDEO_MIME_TYPE.to_string(),
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl DownloadConfig {
    /// Create a config with the staging directory.
    #[must_use]
    pub fn new(staging_directory: PathBuf) -> Self {
        Self {
            staging_directory,
            ..Default::default()
        }
    }

    /// Set the collection placement path.
    #[must_use]
    pub fn with_collection_path(mut self, path: impl Into<String>) -> Self {
        self.collection_path = path.into();
        self
    }

    /// Set the published MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Set the settle delay. `Duration::ZERO` disables the second status
    /// update entirely.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}
