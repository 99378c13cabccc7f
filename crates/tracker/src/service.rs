//! The job service seam.
//!
//! [`JobService`] is the request/response boundary the tracker talks to.
//! [`JobServiceApi`](crate::api::JobServiceApi) implements it over HTTP;
//! tests substitute scripted fakes.

use async_trait::async_trait;
use karaoke_core::job::{CreatedJob, DownloadReference, JobStatusReport};
use karaoke_core::types::JobId;

/// Remote service that runs pipeline jobs.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Ask the service to start a job for `source`.
    async fn create_job(&self, source: &str) -> Result<CreatedJob, ServiceError>;

    /// Fetch the current status of a job.
    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ServiceError>;

    /// Locator of the job's finished output. Never fetched eagerly.
    fn download_reference(&self, job_id: &JobId) -> DownloadReference {
        DownloadReference::for_job(job_id)
    }
}

/// Errors at the transport/protocol level of the job service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Job service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request did not finish within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
