//! Notifications emitted by the job tracker.
//!
//! These are the only channel through which the tracker talks to a
//! presentation layer. Payloads are owned snapshots; consumers cannot
//! reach back into tracker state.

use karaoke_core::job::{DownloadReference, JobStatus, StageMap};
use karaoke_core::types::JobId;
use serde::Serialize;

/// A state change of the tracked job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// The service accepted a submission and assigned a job.
    JobCreated {
        job_id: JobId,
        status: JobStatus,
        stages: StageMap,
    },

    /// A poll returned fresh status for the job.
    StatusUpdated {
        job_id: JobId,
        status: JobStatus,
        stages: StageMap,
    },

    /// The job finished and its output can be downloaded.
    JobCompleted {
        job_id: JobId,
        download: DownloadReference,
    },

    /// The pipeline reported a failure.
    JobFailed { job_id: JobId, error: String },

    /// The service could not create a job.
    SubmissionFailed { source: String, reason: String },

    /// Polling gave up after too many consecutive request failures.
    /// The job itself may still be running on the service.
    PollingAbandoned { job_id: JobId, reason: String },
}

impl TrackerEvent {
    /// Job this event concerns, if one was assigned.
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::JobCreated { job_id, .. }
            | Self::StatusUpdated { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobFailed { job_id, .. }
            | Self::PollingAbandoned { job_id, .. } => Some(job_id),
            Self::SubmissionFailed { .. } => None,
        }
    }

    /// Whether no further events follow for this job.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::JobCompleted { .. }
                | Self::JobFailed { .. }
                | Self::SubmissionFailed { .. }
                | Self::PollingAbandoned { .. }
        )
    }
}
