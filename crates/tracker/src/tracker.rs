//! Job tracker: submission, polling lifecycle, and cancellation.
//!
//! [`JobTracker`] owns one tracker session: the current job (if any),
//! the polling task for it, and the tracker state. At most one job is
//! tracked at a time; a new submission supersedes the previous one.
//!
//! ```text
//! Inactive  --submit ok-->        Polling
//! Inactive  --submit failed-->    Inactive
//! Polling   --poll non-terminal-> Polling
//! Polling   --poll completed-->   Completed
//! Polling   --poll error-->       Failed
//! Polling   --cancel / gave up--> Inactive
//! any       --submit-->           (previous job discarded)
//! ```

use std::sync::Arc;
use std::time::Duration;

use karaoke_core::job::Job;
use karaoke_core::validation::validate_source_reference;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::events::TrackerEvent;
use crate::poller::{run_poll_loop, with_timeout, PollContext};
use crate::service::JobService;
use crate::sink::PresentationSink;

/// How long a stopped polling task gets to exit before it is left detached.
const POLLER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle state of a tracker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No job is being polled.
    Inactive,
    /// A job was created and is being polled.
    Polling,
    /// The last job completed. Terminal.
    Completed,
    /// The last job failed. Terminal.
    Failed,
}

/// Mutable session state shared with the polling task.
pub(crate) struct Session {
    pub job: Option<Job>,
    pub state: TrackerState,
    pub poller: Option<PollerHandle>,
}

/// Handle to a running polling task.
pub(crate) struct PollerHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    /// Wait for an already cancelled task to exit.
    ///
    /// Must be called without the session lock held: the task may be
    /// waiting on it before it can observe the cancellation.
    async fn join(self) {
        if tokio::time::timeout(POLLER_STOP_TIMEOUT, self.task)
            .await
            .is_err()
        {
            tracing::warn!("Polling task did not stop in time");
        }
    }
}

impl Session {
    fn new() -> Self {
        Self {
            job: None,
            state: TrackerState::Inactive,
            poller: None,
        }
    }

    /// Cancel the polling task, if any, and hand back its handle.
    ///
    /// The task discards any result it gets after this point.
    fn stop_polling(&mut self) -> Option<PollerHandle> {
        let handle = self.poller.take()?;
        handle.cancel.cancel();
        Some(handle)
    }
}

/// Tracks one karaoke job at a time against a [`JobService`].
///
/// All notifications go to the [`PresentationSink`] supplied at
/// construction. Dropping the tracker stops any polling task.
pub struct JobTracker {
    service: Arc<dyn JobService>,
    sink: Arc<dyn PresentationSink>,
    config: TrackerConfig,
    session: Arc<Mutex<Session>>,
    /// Serializes submissions so each one settles before the next starts.
    submit_lock: Mutex<()>,
    /// Parent of every polling task's token; cancelled on drop.
    shutdown: CancellationToken,
}

impl JobTracker {
    pub fn new(
        service: Arc<dyn JobService>,
        sink: Arc<dyn PresentationSink>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            service,
            sink,
            config,
            session: Arc::new(Mutex::new(Session::new())),
            submit_lock: Mutex::new(()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Submit a source reference and start tracking the resulting job.
    ///
    /// Empty or whitespace-only input fails with
    /// [`TrackerError::InvalidInput`] without contacting the service or
    /// emitting a notification. Otherwise any previous job is discarded
    /// and exactly one of `JobCreated` or `SubmissionFailed` is emitted.
    pub async fn submit(&self, source: &str) -> Result<Job, TrackerError> {
        let source = validate_source_reference(source)?;
        let _submitting = self.submit_lock.lock().await;

        let superseded = {
            let mut session = self.session.lock().await;
            let superseded = session.stop_polling();
            if superseded.is_some() {
                if let Some(previous) = &session.job {
                    tracing::info!(job_id = %previous.id, "Superseding job with new submission");
                }
            }
            session.job = None;
            session.state = TrackerState::Inactive;
            superseded
        };
        if let Some(handle) = superseded {
            handle.join().await;
        }

        tracing::info!(source = %source, "Submitting job");
        let created = with_timeout(
            self.config.request_timeout,
            self.service.create_job(source),
        )
        .await;

        let mut session = self.session.lock().await;
        let created = match created {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(source = %source, error = %e, "Job creation failed");
                self.sink.notify(TrackerEvent::SubmissionFailed {
                    source: source.to_string(),
                    reason: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let job = Job::from_created(created);
        tracing::info!(job_id = %job.id, stages = job.stages.len(), "Job created");

        session.job = Some(job.clone());
        session.state = TrackerState::Polling;
        self.sink.notify(TrackerEvent::JobCreated {
            job_id: job.id.clone(),
            status: job.status.clone(),
            stages: job.stages.clone(),
        });

        let cancel = self.shutdown.child_token();
        let ctx = PollContext {
            job_id: job.id.clone(),
            session: Arc::clone(&self.session),
            service: Arc::clone(&self.service),
            sink: Arc::clone(&self.sink),
            poll_interval: self.config.poll_interval,
            request_timeout: self.config.request_timeout,
            retry: self.config.retry.clone(),
        };
        let task = tokio::spawn(run_poll_loop(ctx, cancel.clone()));
        session.poller = Some(PollerHandle { cancel, task });

        Ok(job)
    }

    /// Stop polling the current job. No-op when not polling.
    ///
    /// The cached job stays available through [`current_job`](Self::current_job).
    pub async fn cancel(&self) {
        let stopped = {
            let mut session = self.session.lock().await;
            let stopped = session.stop_polling();
            if stopped.is_some() {
                session.state = TrackerState::Inactive;
                if let Some(job) = &session.job {
                    tracing::info!(job_id = %job.id, "Polling cancelled");
                }
            }
            stopped
        };
        if let Some(handle) = stopped {
            handle.join().await;
        }
    }

    /// Stop polling and forget the current job.
    pub async fn reset(&self) {
        let stopped = {
            let mut session = self.session.lock().await;
            session.job = None;
            session.state = TrackerState::Inactive;
            session.stop_polling()
        };
        if let Some(handle) = stopped {
            handle.join().await;
        }
    }

    pub async fn state(&self) -> TrackerState {
        self.session.lock().await.state
    }

    /// Snapshot of the most recently known job, if any.
    pub async fn current_job(&self) -> Option<Job> {
        self.session.lock().await.job.clone()
    }

    pub async fn is_polling(&self) -> bool {
        self.session.lock().await.poller.is_some()
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
