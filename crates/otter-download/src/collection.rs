//! Filesystem-backed media collection.
//!
//! Renders the reserve/write/finalize protocol in filesystem terms: a
//! reserved record is a `<name>.pending` file that normal browsing (the
//! [`visible_entries`](FsMediaCollection::visible_entries) listing) never
//! shows, and finalize renames it to its visible name in one atomic step.
//! A crash mid-write therefore leaves an invisible pending entry behind,
//! never a truncated visible one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use otter_core::download::{DownloadError, DownloadResult};
use otter_core::ports::{MediaCollection, MediaRecord, RecordWriter, ReserveRequest};

const PENDING_SUFFIX: &str = ".pending";

/// A media collection rooted in a public directory.
pub struct FsMediaCollection {
    root: PathBuf,
}

impl FsMediaCollection {
    /// Create a collection rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The collection root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries discoverable by normal browsing: finalized files only,
    /// sorted by name.
    pub fn visible_entries(&self, relative_path: &str) -> DownloadResult<Vec<PathBuf>> {
        let dir = self.root.join(relative_path);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| DownloadError::from_io_error(&e))? {
            let entry = entry.map_err(|e| DownloadError::from_io_error(&e))?;
            let path = entry.path();
            let pending = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(PENDING_SUFFIX));
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && !pending {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// First free variant of `name` in `dir`: `clip.mp4`, `clip (1).mp4`, ...
    /// counting both visible and pending occupants, the way OS media
    /// stores uniquify display names.
    fn unique_name(dir: &Path, name: &str) -> String {
        if Self::name_is_free(dir, name) {
            return name.to_string();
        }
        let (stem, ext) = split_name(name);
        let mut n = 1u32;
        loop {
            let candidate = if ext.is_empty() {
                format!("{stem} ({n})")
            } else {
                format!("{stem} ({n}).{ext}")
            };
            if Self::name_is_free(dir, &candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn name_is_free(dir: &Path, name: &str) -> bool {
        !dir.join(name).exists() && !dir.join(format!("{name}{PENDING_SUFFIX}")).exists()
    }
}

/// Split `clip.mp4` into `("clip", "mp4")`; extensionless names keep an
/// empty extension.
fn split_name(name: &str) -> (&str, &str) {
    name.rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map_or((name, ""), |(stem, ext)| (stem, ext))
}

#[async_trait]
impl MediaCollection for FsMediaCollection {
    async fn reserve(&self, request: ReserveRequest) -> DownloadResult<MediaRecord> {
        let dir = self.root.join(&request.relative_path);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DownloadError::publish_reserve(e.to_string()))?;

        let name = Self::unique_name(&dir, &request.display_name);
        let pending_path = dir.join(format!("{name}{PENDING_SUFFIX}"));
        fs::File::create(&pending_path)
            .await
            .map_err(|e| DownloadError::publish_reserve(e.to_string()))?;

        tracing::debug!(uri = %pending_path.display(), "Reserved pending gallery record");
        Ok(MediaRecord {
            uri: pending_path.display().to_string(),
            display_name: name,
            mime_type: request.mime_type,
            pending: true,
        })
    }

    async fn open_writer(&self, record: &MediaRecord) -> DownloadResult<RecordWriter> {
        let file = fs::File::create(&record.uri)
            .await
            .map_err(|e| DownloadError::publish_write(e.to_string()))?;
        Ok(Box::new(file))
    }

    async fn finalize(&self, record: &MediaRecord) -> DownloadResult<MediaRecord> {
        let Some(visible) = record.uri.strip_suffix(PENDING_SUFFIX) else {
            // No pending concept for this record; already visible.
            return Ok(record.clone());
        };
        let visible_path = PathBuf::from(visible);
        fs::rename(&record.uri, &visible_path)
            .await
            .map_err(|e| DownloadError::publish_finalize(e.to_string()))?;

        Ok(MediaRecord {
            uri: visible_path.display().to_string(),
            display_name: record.display_name.clone(),
            mime_type: record.mime_type.clone(),
            pending: false,
        })
    }

    async fn discard(&self, record: &MediaRecord) -> DownloadResult<()> {
        match fs::remove_file(&record.uri).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DownloadError::from_io_error(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otter_core::ports::VIDEO_MIME_TYPE;

    fn request(name: &str) -> ReserveRequest {
        ReserveRequest::new(name, VIDEO_MIME_TYPE, "Movies/otter")
    }

    #[tokio::test]
    async fn reserved_records_are_invisible_until_finalized() {
        let root = tempfile::tempdir().unwrap();
        let collection = FsMediaCollection::new(root.path());

        let record = collection.reserve(request("clip.mp4")).await.unwrap();
        assert!(record.pending);
        assert!(collection.visible_entries("Movies/otter").unwrap().is_empty());

        let published = collection.finalize(&record).await.unwrap();
        assert!(!published.pending);
        assert!(published.uri.ends_with("clip.mp4"));

        let visible = collection.visible_entries("Movies/otter").unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible[0].ends_with("clip.mp4"));
    }

    #[tokio::test]
    async fn discard_removes_the_pending_record() {
        let root = tempfile::tempdir().unwrap();
        let collection = FsMediaCollection::new(root.path());

        let record = collection.reserve(request("clip.mp4")).await.unwrap();
        collection.discard(&record).await.unwrap();

        assert!(!PathBuf::from(&record.uri).exists());
        // Discarding again is not an error.
        collection.discard(&record).await.unwrap();
    }

    #[tokio::test]
    async fn display_names_are_uniquified() {
        let root = tempfile::tempdir().unwrap();
        let collection = FsMediaCollection::new(root.path());

        let first = collection.reserve(request("clip.mp4")).await.unwrap();
        collection.finalize(&first).await.unwrap();

        let second = collection.reserve(request("clip.mp4")).await.unwrap();
        assert_eq!(second.display_name, "clip (1).mp4");

        // A still-pending occupant also blocks the name.
        let third = collection.reserve(request("clip.mp4")).await.unwrap();
        assert_eq!(third.display_name, "clip (2).mp4");
    }

    #[test]
    fn split_name_handles_odd_inputs() {
        assert_eq!(split_name("clip.mp4"), ("clip", "mp4"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", "gz"));
        assert_eq!(split_name("noext"), ("noext", ""));
        assert_eq!(split_name(".hidden"), (".hidden", ""));
    }
}
