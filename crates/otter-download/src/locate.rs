//! Artifact discovery.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use otter_core::download::{DownloadError, DownloadResult};

/// Identify the file the last extraction run produced.
///
/// Scans the directory's immediate entries and returns the regular file
/// with the greatest modification time. This is a heuristic, not a true
/// identity match: it is only correct while exactly one job writes to the
/// directory at a time. A leftover from an earlier run can win the
/// comparison, which is why [`StagingArea::prepare`](crate::StagingArea::prepare)
/// sweeps the directory before each job.
///
/// Returns [`DownloadError::ArtifactNotFound`] when the directory holds no
/// regular file; the caller treats that as fatal, not retryable.
pub fn newest_artifact(dir: &Path) -> DownloadResult<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| DownloadError::from_io_error(&e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| DownloadError::from_io_error(&e))?;
        let metadata = entry.metadata().map_err(|e| DownloadError::from_io_error(&e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|e| DownloadError::from_io_error(&e))?;
        let is_newer = newest.as_ref().is_none_or(|(best, _)| modified > *best);
        if is_newer {
            newest = Some((modified, entry.path()));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| DownloadError::artifact_not_found(dir.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::time::Duration;

    fn write_with_mtime(dir: &Path, name: &str, mtime: SystemTime) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"bytes").unwrap();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(mtime).unwrap();
        path
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = newest_artifact(dir.path()).unwrap_err();
        assert!(matches!(err, DownloadError::ArtifactNotFound { .. }));
    }

    #[test]
    fn newest_mtime_wins() {
        let dir = tempfile::tempdir().unwrap();
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        write_with_mtime(dir.path(), "older.mp4", base);
        let expected = write_with_mtime(dir.path(), "newer.mp4", base + Duration::from_secs(60));
        write_with_mtime(dir.path(), "oldest.mp4", base - Duration::from_secs(60));

        assert_eq!(newest_artifact(dir.path()).unwrap(), expected);
    }

    #[test]
    fn directories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let err = newest_artifact(dir.path()).unwrap_err();
        assert!(matches!(err, DownloadError::ArtifactNotFound { .. }));
    }
}
