//! Staging area management.
//!
//! The engine writes its output into a private scratch directory that is
//! invisible to the user's media browsing. The directory is reused across
//! jobs; cleanup of partial files left behind by failed runs is this
//! type's responsibility, not the engine's.

use std::path::{Path, PathBuf};

use otter_core::download::{DownloadError, DownloadResult};

/// The private scratch directory the extraction engine writes into.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create a staging area rooted at `dir`. Nothing touches the
    /// filesystem until [`prepare`](Self::prepare).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The staging directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Make the directory ready for a job: create it if missing and sweep
    /// stale regular files from earlier runs, so the newest-file artifact
    /// lookup cannot pick up a leftover.
    pub fn prepare(&self) -> DownloadResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DownloadError::from_io_error(&e))?;

        let mut swept = 0usize;
        for entry in std::fs::read_dir(&self.dir).map_err(|e| DownloadError::from_io_error(&e))? {
            let entry = entry.map_err(|e| DownloadError::from_io_error(&e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && std::fs::remove_file(entry.path()).is_ok() {
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::debug!(dir = %self.dir.display(), swept, "Swept stale staging files");
        }
        Ok(())
    }

    /// Dispose of the staging copy once a publish attempt has finished.
    /// The file never outlives the attempt; an already-absent file is fine.
    pub fn remove_file(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file");
            }
        }
    }
}
