//! Core domain types and port definitions for otter.
//!
//! This crate holds everything the download pipeline and its adapters
//! share: the observable job state machine, the serializable error
//! taxonomy, the ports behind which the extraction engine and the managed
//! media collection live, and the pipeline configuration. No adapter
//! concerns (subprocess handling, filesystem layout) appear here.

pub mod download;
pub mod ports;
pub mod utils;

// Re-export commonly used types for convenience
pub use download::{DownloadError, DownloadPhase, DownloadResult, DownloadSnapshot, JobId};
pub use ports::{
    DEFAULT_COLLECTION_PATH, DownloadConfig, ExtractionEngine, ExtractionProgress, MediaCollection,
    MediaRecord, ProgressFn, RecordWriter, ReserveRequest, VIDEO_MIME_TYPE,
};
pub use utils::status_line::{STATUS_PLACEHOLDER, STATUS_TEXT_MAX, clean_status_line};
