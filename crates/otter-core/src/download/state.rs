//! Observable job state.
//!
//! One job runs at a time. The orchestrator owns a single
//! [`DownloadSnapshot`] which it publishes through a watch channel; callers
//! observe snapshots, they never mutate them.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ports::MediaRecord;

/// Opaque identifier for one `start` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Phase of the single active job.
///
/// Transitions: `Idle → Running → Publishing → Complete → Settled`, with
/// `Failed` reachable from `Running` and `Publishing`. `Complete`,
/// `Settled` and `Failed` are terminal until the next `start`.
/// `Complete → Settled` is the cosmetic two-stage terminal: the snapshot
/// is fully usable at `Complete`, `Settled` only swaps the status text
/// after a short display delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadPhase {
    /// No job has run yet.
    Idle,
    /// The extraction subprocess is running.
    Running,
    /// The artifact is being located and published.
    Publishing,
    /// The artifact is visible in the gallery.
    Complete,
    /// Post-completion display delay has elapsed.
    Settled,
    /// The job failed; see the snapshot's error.
    Failed,
}

impl DownloadPhase {
    /// String representation for logs and wire formats.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Publishing => "publishing",
            Self::Complete => "complete",
            Self::Settled => "settled",
            Self::Failed => "failed",
        }
    }

    /// Whether a job is currently in flight.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Publishing)
    }

    /// Whether the phase is terminal until the next `start`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Settled | Self::Failed)
    }
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the single tracked job, published on every change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadSnapshot {
    /// Id of the job this snapshot describes; `None` before the first start.
    pub job_id: Option<JobId>,
    /// The URL passed to `start`.
    pub source_url: String,
    /// Current phase.
    pub phase: DownloadPhase,
    /// Progress fraction in `[0, 1]`.
    pub progress: f32,
    /// Estimated seconds remaining, as last reported by the engine.
    pub eta_seconds: u64,
    /// Short human-readable status line.
    pub status_text: String,
    /// The published gallery record, set once the job completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<MediaRecord>,
    /// Human-readable failure message, set when the phase is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadSnapshot {
    /// The pristine pre-first-job snapshot.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            job_id: None,
            source_url: String::new(),
            phase: DownloadPhase::Idle,
            progress: 0.0,
            eta_seconds: 0,
            status_text: String::new(),
            artifact: None,
            error: None,
        }
    }

    /// A fresh snapshot for a job that just started.
    #[must_use]
    pub fn running(job_id: JobId, source_url: impl Into<String>) -> Self {
        Self {
            job_id: Some(job_id),
            source_url: source_url.into(),
            phase: DownloadPhase::Running,
            progress: 0.0,
            eta_seconds: 0,
            status_text: "Initializing...".to_string(),
            artifact: None,
            error: None,
        }
    }

    /// Whether a job is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.phase.is_active()
    }

    /// Whether the job finished successfully.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, DownloadPhase::Complete | DownloadPhase::Settled)
    }
}

impl Default for DownloadSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
