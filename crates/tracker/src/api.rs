//! REST client for the karaoke job service.
//!
//! Wraps the job endpoints (creation, status, download) using
//! [`reqwest`] and implements [`JobService`] on top of them.

use std::path::Path;

use async_trait::async_trait;
use karaoke_core::job::{CreatedJob, DownloadReference, JobStatusReport};
use karaoke_core::types::JobId;
use tokio::io::AsyncWriteExt;

use crate::service::{JobService, ServiceError};

/// HTTP client for a single job service.
pub struct JobServiceApi {
    client: reqwest::Client,
    api_url: String,
}

impl JobServiceApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8000/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Base HTTP URL, without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Turn a download reference into an absolute URL on this service.
    pub fn resolve(&self, reference: &DownloadReference) -> String {
        format!("{}{}", self.api_url, reference)
    }

    /// Download a finished job's output to `destination`.
    ///
    /// Sends `GET /jobs/{job_id}/download` and writes the body to disk
    /// chunk by chunk. Returns the number of bytes written. If the body
    /// cannot be read or written in full, the partial file is removed.
    pub async fn fetch_download(
        &self,
        job_id: &JobId,
        destination: &Path,
    ) -> Result<u64, ServiceError> {
        let url = self.resolve(&DownloadReference::for_job(job_id));
        let mut response = Self::ensure_success(self.client.get(&url).send().await?).await?;

        let mut file = tokio::fs::File::create(destination).await?;
        let written = match Self::write_body(&mut response, &mut file).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                    tracing::warn!(
                        path = %destination.display(),
                        error = %remove_err,
                        "Failed to remove partial download",
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            job_id = %job_id,
            bytes = written,
            path = %destination.display(),
            "Downloaded job output",
        );

        Ok(written)
    }

    // ---- private helpers ----

    /// Stream the response body into `file`. Returns the bytes written.
    async fn write_body(
        response: &mut reqwest::Response,
        file: &mut tokio::fs::File,
    ) -> Result<u64, ServiceError> {
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ServiceError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    ///
    /// Decoding failures are reported as [`ServiceError::Malformed`] rather
    /// than as transport errors.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl JobService for JobServiceApi {
    /// Sends `POST /jobs` with `{"url": source}`.
    async fn create_job(&self, source: &str) -> Result<CreatedJob, ServiceError> {
        let body = serde_json::json!({ "url": source });

        let response = self
            .client
            .post(format!("{}/jobs", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Sends `GET /jobs/{job_id}`.
    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ServiceError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.api_url, job_id.as_str()))
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
