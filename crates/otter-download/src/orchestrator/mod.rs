//! Download orchestration.
//!
//! The orchestrator owns the single source of truth for job state: a
//! [`DownloadSnapshot`] held in a `tokio::sync::watch` channel. One job
//! runs at a time on a spawned worker task; that worker is the only
//! writer while the job is in flight, and any number of observers read
//! snapshots from their own receivers.
//!
//! # Concurrency Model
//!
//! - `start` installs a fresh Running snapshot with a single
//!   `send_if_modified`, so the not-already-active check and the
//!   transition are one atomic step
//! - the worker writes progress and phase changes through `send_modify`
//! - the cosmetic Complete → Settled update is guarded by job id, so a
//!   job started during the settle window is never clobbered

mod worker;

use std::sync::Arc;

use tokio::sync::watch;

use otter_core::download::{DownloadError, DownloadResult, DownloadSnapshot, JobId};
use otter_core::ports::{DownloadConfig, ExtractionEngine, MediaCollection};

use crate::publish::MediaPublisher;
use crate::staging::StagingArea;

use worker::WorkerDeps;

/// Sequences extraction, artifact lookup and publication for one job at
/// a time, and broadcasts the observable state.
pub struct DownloadOrchestrator {
    engine: Arc<dyn ExtractionEngine>,
    publisher: Arc<MediaPublisher>,
    staging: StagingArea,
    config: DownloadConfig,
    state_tx: watch::Sender<DownloadSnapshot>,
}

impl DownloadOrchestrator {
    /// Create an orchestrator over the given engine and collection.
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        collection: Arc<dyn MediaCollection>,
        config: DownloadConfig,
    ) -> Self {
        let publisher = Arc::new(MediaPublisher::new(
            collection,
            config.collection_path.as_str(),
            config.mime_type.as_str(),
        ));
        let (state_tx, _) = watch::channel(DownloadSnapshot::idle());
        Self {
            engine,
            publisher,
            staging: StagingArea::new(config.staging_directory.clone()),
            config,
            state_tx,
        }
    }

    /// Subscribe to state snapshots. Safe to call from any thread.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DownloadSnapshot> {
        self.state_tx.subscribe()
    }

    /// The current state snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DownloadSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Start a new job for `url`.
    ///
    /// Rejects blank URLs with [`DownloadError::InvalidInput`] and rejects
    /// while a job is Running or Publishing with
    /// [`DownloadError::JobActive`]; neither changes state. Terminal
    /// phases (Complete, Settled, Failed) accept a new start, replacing
    /// the previous snapshot wholesale.
    ///
    /// Must be called within a tokio runtime; the job runs on a spawned
    /// worker task and this returns immediately with the job id.
    pub fn start(&self, url: &str) -> DownloadResult<JobId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidInput);
        }

        let id = JobId::new();
        let mut active_id = None;
        let installed = self.state_tx.send_if_modified(|state| {
            if state.phase.is_active() {
                active_id = state.job_id;
                return false;
            }
            *state = DownloadSnapshot::running(id, url);
            true
        });
        if !installed {
            return Err(DownloadError::job_active(
                active_id.map_or_else(String::new, |active| active.to_string()),
            ));
        }

        tracing::info!(id = %id, url = %url, "Download started");
        let deps = WorkerDeps {
            engine: Arc::clone(&self.engine),
            publisher: Arc::clone(&self.publisher),
            staging: self.staging.clone(),
            settle_delay: self.config.settle_delay,
        };
        let state_tx = self.state_tx.clone();
        let url = url.to_string();
        tokio::spawn(worker::run(deps, id, url, state_tx));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use otter_core::ports::{MediaRecord, ProgressFn, RecordWriter, ReserveRequest};
    use std::path::Path;

    struct NeverEngine;

    #[async_trait]
    impl ExtractionEngine for NeverEngine {
        async fn extract(
            &self,
            _url: &str,
            _staging_dir: &Path,
            _on_progress: ProgressFn<'_>,
        ) -> otter_core::DownloadResult<()> {
            unreachable!("engine must not run for rejected input")
        }
    }

    struct NeverCollection;

    #[async_trait]
    impl MediaCollection for NeverCollection {
        async fn reserve(
            &self,
            _request: ReserveRequest,
        ) -> otter_core::DownloadResult<MediaRecord> {
            unreachable!()
        }

        async fn open_writer(
            &self,
            _record: &MediaRecord,
        ) -> otter_core::DownloadResult<RecordWriter> {
            unreachable!()
        }

        async fn finalize(
            &self,
            _record: &MediaRecord,
        ) -> otter_core::DownloadResult<MediaRecord> {
            unreachable!()
        }

        async fn discard(&self, _record: &MediaRecord) -> otter_core::DownloadResult<()> {
            unreachable!()
        }
    }

    fn orchestrator() -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            Arc::new(NeverEngine),
            Arc::new(NeverCollection),
            DownloadConfig::default(),
        )
    }

    #[test]
    fn starts_idle() {
        let orchestrator = orchestrator();
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot, DownloadSnapshot::idle());
        assert_eq!(*orchestrator.subscribe().borrow(), snapshot);
    }

    #[test]
    fn blank_urls_are_rejected_before_any_work() {
        // No runtime needed: rejection happens before the worker spawns.
        let orchestrator = orchestrator();
        assert!(matches!(
            orchestrator.start("   "),
            Err(DownloadError::InvalidInput)
        ));
        assert_eq!(orchestrator.snapshot(), DownloadSnapshot::idle());
    }
}
