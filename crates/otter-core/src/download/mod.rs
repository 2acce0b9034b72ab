//! Download domain types: job state machine and error taxonomy.

mod errors;
mod state;

pub use errors::{DownloadError, DownloadResult};
pub use state::{DownloadPhase, DownloadSnapshot, JobId};
