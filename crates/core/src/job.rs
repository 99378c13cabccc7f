//! Job and stage model as reported by the job service.
//!
//! The service is the single source of truth for stage state: the client
//! never edits a [`Stage`] itself, it only swaps in the whole
//! [`StageMap`] it receives on each status fetch.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

/// Overall job status literal: queued, nothing started yet.
pub const STATUS_PENDING: &str = "pending";

/// Overall job status literal: at least one stage is running.
pub const STATUS_RUNNING: &str = "running";

/// Overall job status literal: every stage finished.
pub const STATUS_COMPLETED: &str = "completed";

/// Overall job status literal: the pipeline reported an error.
pub const STATUS_ERRORED: &str = "errored";

/// Overall job status literal the backend uses for a failed pipeline.
pub const STATUS_FAILED: &str = "failed";

/// Overall status of a job.
///
/// Values outside the known vocabulary are kept verbatim in
/// [`JobStatus::Other`] so they can still be shown to the user.
/// `errored` and `failed` mean the same thing but keep their own
/// variants, so each displays the way the service spelled it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Errored,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Running => STATUS_RUNNING,
            Self::Completed => STATUS_COMPLETED,
            Self::Errored => STATUS_ERRORED,
            Self::Failed => STATUS_FAILED,
            Self::Other(s) => s,
        }
    }

    /// Whether this status ends the job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            STATUS_PENDING => Self::Pending,
            STATUS_RUNNING => Self::Running,
            STATUS_COMPLETED => Self::Completed,
            STATUS_ERRORED => Self::Errored,
            STATUS_FAILED => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the backend pipeline.
///
/// `status` is open-ended text (`pending`, `running`, `success`,
/// `completed`, `failed`, ...) and is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Stage {
    /// A stage carrying only a status value.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            started_at: None,
            finished_at: None,
            message: None,
            output: None,
        }
    }
}

/// Stage name to stage, in the order the service listed them.
pub type StageMap = IndexMap<String, Stage>;

/// Response body of a job creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedJob {
    pub job_id: JobId,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub stages: StageMap,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response body of a job status request.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub stages: StageMap,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output_file: Option<String>,
}

impl JobStatusReport {
    /// The reported error message, ignoring empty or blank values.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
    }
}

/// Locator of a finished job's output, relative to the service base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadReference(String);

impl DownloadReference {
    /// Conventional download path for a job: `/jobs/{id}/download`.
    pub fn for_job(job_id: &JobId) -> Self {
        Self(format!("/jobs/{job_id}/download"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side view of one submitted job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub stages: StageMap,
    pub error: Option<String>,
    /// Source reference echoed back by the service, if any.
    pub source_url: Option<String>,
    pub created_at: Option<String>,
    pub output_file: Option<String>,
    /// When the client last replaced this view.
    pub last_updated: Timestamp,
}

impl Job {
    /// Build the initial view from a creation response.
    pub fn from_created(created: CreatedJob) -> Self {
        Self {
            id: created.job_id,
            status: created.status,
            stages: created.stages,
            error: None,
            source_url: created.url,
            created_at: created.created_at,
            output_file: None,
            last_updated: chrono::Utc::now(),
        }
    }

    /// Replace status, stages, and error with a freshly fetched report.
    ///
    /// This is a full replace: stages absent from `report` disappear.
    pub fn apply(&mut self, report: JobStatusReport) {
        self.error = report.error_message().map(str::to_string);
        self.status = report.status;
        self.stages = report.stages;
        if report.output_file.is_some() {
            self.output_file = report.output_file;
        }
        self.last_updated = chrono::Utc::now();
    }
}
