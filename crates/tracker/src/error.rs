use karaoke_core::error::CoreError;

use crate::service::ServiceError;

/// Errors returned from [`JobTracker::submit`](crate::tracker::JobTracker::submit).
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The source reference was rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The job service could not create the job.
    #[error("Failed to create job: {0}")]
    Service(#[from] ServiceError),
}

impl From<CoreError> for TrackerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::InvalidInput(msg),
        }
    }
}
