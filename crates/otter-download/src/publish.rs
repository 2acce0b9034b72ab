//! Two-phase publication into the managed media collection.
//!
//! Reserve a pending record, stream the staged bytes into it, then make
//! it visible. Any failure after the reserve discards the record again,
//! so at every observable point the published record is either fully
//! absent or fully complete - never visible-but-truncated.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use otter_core::download::{DownloadError, DownloadResult};
use otter_core::ports::{MediaCollection, MediaRecord, ReserveRequest};

/// Drives the reserve/write/finalize protocol against a collection.
pub struct MediaPublisher {
    collection: Arc<dyn MediaCollection>,
    collection_path: String,
    mime_type: String,
}

impl MediaPublisher {
    /// Create a publisher targeting `collection_path` inside `collection`.
    pub fn new(
        collection: Arc<dyn MediaCollection>,
        collection_path: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            collection,
            collection_path: collection_path.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Publish the file at `source` under `display_name`.
    ///
    /// The staging copy is left in place; disposing of it is the caller's
    /// job once this returns.
    pub async fn publish(&self, source: &Path, display_name: &str) -> DownloadResult<MediaRecord> {
        let request = ReserveRequest::new(
            display_name,
            self.mime_type.as_str(),
            self.collection_path.as_str(),
        );
        let record = self.collection.reserve(request).await?;

        if let Err(e) = self.write_bytes(source, &record).await {
            self.roll_back(&record).await;
            return Err(e);
        }

        match self.collection.finalize(&record).await {
            Ok(published) => {
                tracing::info!(uri = %published.uri, "Published to gallery");
                Ok(published)
            }
            Err(e) => {
                self.roll_back(&record).await;
                Err(e)
            }
        }
    }

    /// Copy all bytes from `source` into the reserved record. A source
    /// with zero bytes available counts as a write failure.
    async fn write_bytes(&self, source: &Path, record: &MediaRecord) -> DownloadResult<()> {
        let mut reader = tokio::fs::File::open(source)
            .await
            .map_err(|e| DownloadError::publish_write(e.to_string()))?;
        let len = reader
            .metadata()
            .await
            .map_err(|e| DownloadError::publish_write(e.to_string()))?
            .len();
        if len == 0 {
            return Err(DownloadError::publish_write(format!(
                "no bytes available in {}",
                source.display()
            )));
        }

        let mut writer = self.collection.open_writer(record).await?;
        tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(|e| DownloadError::publish_write(e.to_string()))?;
        writer
            .shutdown()
            .await
            .map_err(|e| DownloadError::publish_write(e.to_string()))?;
        Ok(())
    }

    async fn roll_back(&self, record: &MediaRecord) {
        tracing::warn!(uri = %record.uri, "Publish failed, discarding reserved record");
        if let Err(e) = self.collection.discard(record).await {
            tracing::warn!(uri = %record.uri, error = %e, "Failed to discard reserved record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use tokio::io::AsyncWrite;

    use otter_core::ports::RecordWriter;

    /// What the stub collection should do when asked for a writer.
    #[derive(Clone, Copy)]
    enum WriterBehavior {
        Sink,
        FailMidCopy,
    }

    /// In-memory collection that records the protocol calls it receives.
    struct StubCollection {
        writer: WriterBehavior,
        fail_finalize: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl StubCollection {
        fn new(writer: WriterBehavior) -> Self {
            Self {
                writer,
                fail_finalize: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_finalize() -> Self {
            Self {
                writer: WriterBehavior::Sink,
                fail_finalize: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl MediaCollection for StubCollection {
        async fn reserve(&self, request: ReserveRequest) -> DownloadResult<MediaRecord> {
            self.record("reserve");
            Ok(MediaRecord {
                uri: format!("stub://{}", request.display_name),
                display_name: request.display_name,
                mime_type: request.mime_type,
                pending: true,
            })
        }

        async fn open_writer(&self, _record: &MediaRecord) -> DownloadResult<RecordWriter> {
            self.record("open_writer");
            match self.writer {
                WriterBehavior::Sink => Ok(Box::new(tokio::io::sink())),
                WriterBehavior::FailMidCopy => Ok(Box::new(BrokenWriter)),
            }
        }

        async fn finalize(&self, record: &MediaRecord) -> DownloadResult<MediaRecord> {
            self.record("finalize");
            if self.fail_finalize {
                return Err(DownloadError::publish_finalize("collection unavailable"));
            }
            Ok(MediaRecord {
                pending: false,
                ..record.clone()
            })
        }

        async fn discard(&self, _record: &MediaRecord) -> DownloadResult<()> {
            self.record("discard");
            Ok(())
        }
    }

    /// Writer that fails on the first byte.
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn publisher(collection: Arc<StubCollection>) -> MediaPublisher {
        MediaPublisher::new(collection, "Movies/otter", "video/mp4")
    }

    fn staged_file(dir: &tempfile::TempDir, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn publish_runs_reserve_write_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged_file(&dir, b"video bytes");
        let collection = Arc::new(StubCollection::new(WriterBehavior::Sink));

        let record = publisher(Arc::clone(&collection))
            .publish(&source, "clip.mp4")
            .await
            .unwrap();

        assert!(!record.pending);
        assert_eq!(collection.calls(), vec!["reserve", "open_writer", "finalize"]);
    }

    #[tokio::test]
    async fn mid_copy_failure_discards_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged_file(&dir, b"video bytes");
        let collection = Arc::new(StubCollection::new(WriterBehavior::FailMidCopy));

        let err = publisher(Arc::clone(&collection))
            .publish(&source, "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::PublishWrite { .. }));
        assert_eq!(collection.calls(), vec!["reserve", "open_writer", "discard"]);
    }

    #[tokio::test]
    async fn empty_source_discards_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged_file(&dir, b"");
        let collection = Arc::new(StubCollection::new(WriterBehavior::Sink));

        let err = publisher(Arc::clone(&collection))
            .publish(&source, "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::PublishWrite { .. }));
        assert_eq!(collection.calls(), vec!["reserve", "discard"]);
    }

    #[tokio::test]
    async fn finalize_failure_discards_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged_file(&dir, b"video bytes");
        let collection = Arc::new(StubCollection::failing_finalize());

        let err = publisher(Arc::clone(&collection))
            .publish(&source, "clip.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::PublishFinalize { .. }));
        assert_eq!(
            collection.calls(),
            vec!["reserve", "open_writer", "finalize", "discard"]
        );
    }

    #[tokio::test]
    async fn missing_source_discards_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let collection = Arc::new(StubCollection::new(WriterBehavior::Sink));

        let err = publisher(Arc::clone(&collection))
            .publish(&dir.path().join("gone.mp4"), "gone.mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::PublishWrite { .. }));
        assert_eq!(collection.calls(), vec!["reserve", "discard"]);
    }
}
