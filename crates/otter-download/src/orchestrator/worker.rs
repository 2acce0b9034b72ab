//! Job execution pipeline.
//!
//! The worker operates on value types and cloned Arc dependencies, with
//! no reference back to the orchestrator. It is the only writer of the
//! state channel while a job runs: progress callbacks, phase transitions
//! and the terminal states all go through `send_modify` on the same
//! sender, so observers always see one consistent snapshot.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use otter_core::clean_status_line;
use otter_core::download::{DownloadPhase, DownloadResult, DownloadSnapshot, JobId};
use otter_core::ports::{ExtractionEngine, ExtractionProgress, MediaRecord};

use crate::locate::newest_artifact;
use crate::publish::MediaPublisher;
use crate::staging::StagingArea;

/// Cloned dependencies a worker needs to run one job.
pub(crate) struct WorkerDeps {
    pub engine: Arc<dyn ExtractionEngine>,
    pub publisher: Arc<MediaPublisher>,
    pub staging: StagingArea,
    pub settle_delay: Duration,
}

/// Run one job to its terminal state.
pub(crate) async fn run(
    deps: WorkerDeps,
    id: JobId,
    url: String,
    state_tx: watch::Sender<DownloadSnapshot>,
) {
    match run_pipeline(&deps, &url, &state_tx).await {
        Ok(record) => {
            state_tx.send_modify(|s| {
                s.phase = DownloadPhase::Complete;
                s.progress = 1.0;
                s.status_text = "Complete!".to_string();
                s.artifact = Some(record);
            });
            tracing::info!(id = %id, "Download complete");
            settle(&deps, id, &state_tx).await;
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "Download failed");
            // Progress and ETA keep their last values.
            state_tx.send_modify(|s| {
                s.phase = DownloadPhase::Failed;
                s.status_text = "Download failed".to_string();
                s.error = Some(e.user_message());
            });
        }
    }
}

/// Extract, locate, publish. Returns the published record.
async fn run_pipeline(
    deps: &WorkerDeps,
    url: &str,
    state_tx: &watch::Sender<DownloadSnapshot>,
) -> DownloadResult<MediaRecord> {
    deps.staging.prepare()?;

    let progress_tx = state_tx.clone();
    let on_progress = move |update: ExtractionProgress| {
        let status = derive_status(&update);
        progress_tx.send_modify(|s| {
            s.progress = update.fraction();
            s.eta_seconds = update.eta_seconds;
            s.status_text = status;
        });
    };
    deps.engine
        .extract(url, deps.staging.path(), &on_progress)
        .await?;

    state_tx.send_modify(|s| {
        s.phase = DownloadPhase::Publishing;
        s.status_text = "Saving to gallery...".to_string();
    });

    let artifact = newest_artifact(deps.staging.path())?;
    let display_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .map_or_else(|| "video.mp4".to_string(), ToString::to_string);

    let published = deps.publisher.publish(&artifact, &display_name).await;
    // The staging copy never outlives the publish attempt.
    deps.staging.remove_file(&artifact);
    published
}

/// After the display delay, swap the completion message - unless a newer
/// job took over the state in the meantime.
async fn settle(deps: &WorkerDeps, id: JobId, state_tx: &watch::Sender<DownloadSnapshot>) {
    if deps.settle_delay.is_zero() {
        return;
    }
    tokio::time::sleep(deps.settle_delay).await;
    state_tx.send_if_modified(|s| {
        if s.job_id == Some(id) && s.phase == DownloadPhase::Complete {
            s.phase = DownloadPhase::Settled;
            s.status_text = "Saved to gallery".to_string();
            true
        } else {
            false
        }
    });
}

/// Positive progress shows a percentage; anything else falls back to the
/// cleaned raw line, never a numeric string.
#[allow(clippy::cast_possible_truncation)]
fn derive_status(update: &ExtractionProgress) -> String {
    if update.percent > 0.0 {
        format!("Downloading: {}%", update.percent as i64)
    } else {
        clean_status_line(update.line.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_percent_shows_a_percentage() {
        let update = ExtractionProgress::new(12.5, 30, Some("[download]  12.5% ...".to_string()));
        assert_eq!(derive_status(&update), "Downloading: 12%");
    }

    #[test]
    fn zero_percent_falls_back_to_the_cleaned_line() {
        let update = ExtractionProgress::new(
            0.0,
            0,
            Some("[download] Destination: foo.mp4".to_string()),
        );
        assert_eq!(derive_status(&update), "Destination: foo.mp4");
    }

    #[test]
    fn negative_percent_falls_back_to_the_cleaned_line() {
        let update = ExtractionProgress::new(-1.0, 0, Some("[ffmpeg] Merging".to_string()));
        assert_eq!(derive_status(&update), "Merging");
    }

    #[test]
    fn no_line_and_no_percent_yields_the_placeholder() {
        let update = ExtractionProgress::new(0.0, 0, None);
        assert_eq!(derive_status(&update), "Processing...");
    }
}
