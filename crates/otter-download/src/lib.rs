//! Download pipeline for otter.
//!
//! Submit a short-video URL, run yt-dlp against a private staging
//! directory, stream its progress into an observable state machine, and
//! transactionally publish the finished file into a public media
//! collection.
//!
//! # Architecture
//!
//! - [`DownloadOrchestrator`] - sequences the pipeline and owns the single
//!   source of truth for job state, broadcast through a watch channel
//! - [`YtDlpEngine`] - spawns the external extraction subprocess with a
//!   fixed argument contract and parses its progress lines
//! - [`StagingArea`] / [`newest_artifact`] - scratch directory management
//!   and artifact discovery
//! - [`MediaPublisher`] - the reserve/write/finalize publish protocol with
//!   rollback, against any [`MediaCollection`]
//! - [`FsMediaCollection`] - directory-backed collection implementation

// Re-export core types for convenience
pub use otter_core::download::{
    DownloadError, DownloadPhase, DownloadResult, DownloadSnapshot, JobId,
};
pub use otter_core::ports::{
    DownloadConfig, ExtractionEngine, ExtractionProgress, MediaCollection, MediaRecord,
    ProgressFn, ReserveRequest,
};

mod collection;
mod engine;
mod locate;
mod orchestrator;
mod publish;
mod staging;

pub use collection::FsMediaCollection;
pub use engine::{VideoInfo, YtDlpEngine};
pub use locate::newest_artifact;
pub use orchestrator::DownloadOrchestrator;
pub use publish::MediaPublisher;
pub use staging::StagingArea;
