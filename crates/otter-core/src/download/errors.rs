//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error`. For I/O errors, we capture the kind
//! and message as strings.
//!
//! Every variant is terminal for the current job: nothing is retried by
//! the pipeline itself, retry is a caller decision (call `start` again).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the download pipeline.
///
/// Designed to be serializable across adapter boundaries (CLI, IPC, GUI)
/// without depending on non-serializable types like `std::io::Error`.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// The submitted URL was blank. Rejected before any work starts.
    #[error("invalid input: URL must not be blank")]
    InvalidInput,

    /// A job is already running or publishing; the new start was rejected.
    #[error("a job is already active: {id}")]
    JobActive {
        /// The id of the job that is currently active.
        id: String,
    },

    /// The extraction subprocess failed (non-zero exit, spawn error,
    /// interrupted stream).
    #[error("extraction failed: {message}")]
    Extraction {
        /// Diagnostic output captured from the subprocess.
        message: String,
    },

    /// The job reported success but the staging directory holds no file.
    #[error("no artifact found in {dir}")]
    ArtifactNotFound {
        /// The staging directory that was scanned.
        dir: String,
    },

    /// The media collection refused to create a record.
    #[error("publish reserve failed: {message}")]
    PublishReserve {
        /// Detailed error message.
        message: String,
    },

    /// Copying bytes into the reserved record failed.
    #[error("publish write failed: {message}")]
    PublishWrite {
        /// Detailed error message.
        message: String,
    },

    /// The reserved record could not be made visible.
    #[error("publish finalize failed: {message}")]
    PublishFinalize {
        /// Detailed error message.
        message: String,
    },

    /// Ambient I/O error during staging or cleanup.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "NotFound", "PermissionDenied").
        kind: String,
        /// Detailed error message.
        message: String,
    },
}

impl DownloadError {
    /// Create a job-active rejection.
    pub fn job_active(id: impl Into<String>) -> Self {
        Self::JobActive { id: id.into() }
    }

    /// Create an extraction failure.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an artifact-not-found failure.
    pub fn artifact_not_found(dir: impl Into<String>) -> Self {
        Self::ArtifactNotFound { dir: dir.into() }
    }

    /// Create a reserve-phase publish failure.
    pub fn publish_reserve(message: impl Into<String>) -> Self {
        Self::PublishReserve {
            message: message.into(),
        }
    }

    /// Create a write-phase publish failure.
    pub fn publish_write(message: impl Into<String>) -> Self {
        Self::PublishWrite {
            message: message.into(),
        }
    }

    /// Create a finalize-phase publish failure.
    pub fn publish_finalize(message: impl Into<String>) -> Self {
        Self::PublishFinalize {
            message: message.into(),
        }
    }

    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Check if this failure happened after a gallery record was reserved.
    ///
    /// These are the variants whose handling carries a mandatory rollback
    /// side effect in addition to reporting.
    #[must_use]
    pub const fn is_publish_failure(&self) -> bool {
        matches!(
            self,
            Self::PublishWrite { .. } | Self::PublishFinalize { .. }
        )
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput => "Enter a URL to download.".to_string(),
            Self::JobActive { .. } => "A download is already in progress.".to_string(),
            // Subprocess diagnostics are already written for humans.
            Self::Extraction { message } => message.clone(),
            Self::ArtifactNotFound { .. } => {
                "Download finished but no file was found.".to_string()
            }
            Self::PublishReserve { message } => {
                format!("Could not create a gallery entry: {message}")
            }
            Self::PublishWrite { message } => {
                format!("Could not write to the gallery: {message}")
            }
            Self::PublishFinalize { message } => {
                format!("Could not publish the gallery entry: {message}")
            }
            Self::Io { message, .. } => format!("File operation failed: {message}"),
        }
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_from_std_captures_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DownloadError::from_io_error(&io_err);

        match err {
            DownloadError::Io { kind, message } => {
                assert_eq!(kind, "NotFound");
                assert!(message.contains("file not found"));
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn error_serialization_round_trips() {
        let err = DownloadError::extraction("HTTP Error 403: Forbidden");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("403"));

        let parsed: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn publish_failures_require_rollback() {
        assert!(DownloadError::publish_write("stream closed").is_publish_failure());
        assert!(DownloadError::publish_finalize("rename failed").is_publish_failure());
        // Reserve failing means no record was created - nothing to roll back.
        assert!(!DownloadError::publish_reserve("insert refused").is_publish_failure());
        assert!(!DownloadError::extraction("boom").is_publish_failure());
    }

    #[test]
    fn extraction_user_message_is_the_diagnostic() {
        let err = DownloadError::extraction("network error");
        assert_eq!(err.user_message(), "network error");
    }

    #[test]
    fn user_messages_name_the_failed_stage() {
        let err = DownloadError::publish_reserve("collection full");
        assert!(err.user_message().contains("gallery entry"));
        assert!(err.user_message().contains("collection full"));
    }
}
