//! Managed media collection port.
//!
//! The collection is an OS-indexed public media store with a
//! reserve/write/finalize insertion protocol: records are created hidden
//! ("pending"), filled with bytes, and only then made discoverable. The
//! publisher drives the protocol; implementations only supply the
//! primitive operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;

use crate::download::DownloadResult;

/// Request to reserve a new record in the collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveRequest {
    /// Name shown when browsing the collection.
    pub display_name: String,
    /// MIME type of the content that will be written.
    pub mime_type: String,
    /// Relative placement path inside the collection (e.g. `Movies/otter`).
    pub relative_path: String,
}

impl ReserveRequest {
    /// Create a reserve request.
    pub fn new(
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            mime_type: mime_type.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// A record in the managed media collection.
///
/// Invariant: a record is never left permanently pending. Any failure
/// after creation discards it again; only [`MediaCollection::finalize`]
/// clears the flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Collection-specific locator for the record.
    pub uri: String,
    /// Name shown when browsing, possibly uniquified by the collection.
    pub display_name: String,
    /// MIME type the record was reserved with.
    pub mime_type: String,
    /// Whether the record is still hidden from normal browsing.
    pub pending: bool,
}

/// Byte sink for a reserved record.
pub type RecordWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Port for the managed media collection.
#[async_trait]
pub trait MediaCollection: Send + Sync {
    /// Insert a new record in pending state.
    ///
    /// Failure here means no record was created; there is nothing to roll
    /// back.
    async fn reserve(&self, request: ReserveRequest) -> DownloadResult<MediaRecord>;

    /// Open a write stream on a reserved record.
    async fn open_writer(&self, record: &MediaRecord) -> DownloadResult<RecordWriter>;

    /// Clear the pending flag, making the record discoverable.
    ///
    /// Returns the updated record; the locator may change when the record
    /// becomes visible. Collections without a pending concept return the
    /// record unchanged.
    async fn finalize(&self, record: &MediaRecord) -> DownloadResult<MediaRecord>;

    /// Remove a record (pending or visible). Removing an already-absent
    /// record is not an error.
    async fn discard(&self, record: &MediaRecord) -> DownloadResult<()>;
}
