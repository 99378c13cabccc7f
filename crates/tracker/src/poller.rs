//! Cancellable status polling loop for one job.
//!
//! Polls are serialized: the next poll is only scheduled once the
//! previous result has been applied. Every result is applied while the
//! session lock is held and only if the loop's cancellation token is
//! still live, so a response that lands after `cancel()` (or after a new
//! submission) never touches state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use karaoke_core::job::JobStatusReport;
use karaoke_core::types::JobId;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::events::TrackerEvent;
use crate::outcome::{interpret, PollOutcome};
use crate::retry::RetryPolicy;
use crate::service::{JobService, ServiceError};
use crate::sink::PresentationSink;
use crate::tracker::{Session, TrackerState};

/// Everything the polling task needs, owned so it can be spawned.
pub(crate) struct PollContext {
    pub job_id: JobId,
    pub session: Arc<Mutex<Session>>,
    pub service: Arc<dyn JobService>,
    pub sink: Arc<dyn PresentationSink>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

/// Bound a service call by `timeout`, mapping expiry to [`ServiceError::Timeout`].
pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(ServiceError::Timeout(timeout)))
}

/// Poll the job until a terminal status, retry exhaustion, or cancellation.
///
/// The first poll fires one interval after the loop starts.
pub(crate) async fn run_poll_loop(ctx: PollContext, cancel: CancellationToken) {
    let mut failures = 0u32;
    let mut delay = ctx.poll_interval;

    tracing::debug!(
        job_id = %ctx.job_id,
        poll_interval_ms = ctx.poll_interval.as_millis() as u64,
        "Polling started",
    );

    loop {
        // Wait before the next poll, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = with_timeout(ctx.request_timeout, ctx.service.get_job_status(&ctx.job_id)) => result,
        };

        let mut session = ctx.session.lock().await;
        if cancel.is_cancelled() {
            tracing::debug!(job_id = %ctx.job_id, "Discarding poll result after cancellation");
            break;
        }

        match result {
            Ok(report) => {
                if failures > 0 {
                    tracing::info!(job_id = %ctx.job_id, failures, "Polling recovered");
                }
                failures = 0;
                delay = ctx.poll_interval;

                if apply_report(&mut session, &ctx, report).is_terminal() {
                    session.poller = None;
                    break;
                }
            }
            Err(e) => {
                failures += 1;
                if ctx.retry.is_exhausted(failures) {
                    tracing::error!(
                        job_id = %ctx.job_id,
                        failures,
                        error = %e,
                        "Giving up on job status polling",
                    );
                    session.state = TrackerState::Inactive;
                    session.poller = None;
                    ctx.sink.notify(TrackerEvent::PollingAbandoned {
                        job_id: ctx.job_id.clone(),
                        reason: format!("{failures} consecutive poll failures, last: {e}"),
                    });
                    break;
                }

                delay = ctx.retry.delay_for(failures);
                tracing::warn!(
                    job_id = %ctx.job_id,
                    failures,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %e,
                    "Status poll failed",
                );
            }
        }
    }

    tracing::debug!(job_id = %ctx.job_id, "Polling stopped");
}

/// Replace the cached job with `report`, notify, and settle terminal state.
fn apply_report(session: &mut Session, ctx: &PollContext, report: JobStatusReport) -> PollOutcome {
    let outcome = interpret(&report);

    let Some(job) = session.job.as_mut() else {
        return PollOutcome::Continue;
    };
    job.apply(report);

    ctx.sink.notify(TrackerEvent::StatusUpdated {
        job_id: job.id.clone(),
        status: job.status.clone(),
        stages: job.stages.clone(),
    });

    match &outcome {
        PollOutcome::Continue => {}
        PollOutcome::Completed => {
            let download = ctx.service.download_reference(&job.id);
            tracing::info!(job_id = %job.id, download = %download, "Job completed");
            session.state = TrackerState::Completed;
            ctx.sink.notify(TrackerEvent::JobCompleted {
                job_id: ctx.job_id.clone(),
                download,
            });
        }
        PollOutcome::Failed(error) => {
            tracing::warn!(job_id = %job.id, error = %error, "Job failed");
            session.state = TrackerState::Failed;
            ctx.sink.notify(TrackerEvent::JobFailed {
                job_id: ctx.job_id.clone(),
                error: error.clone(),
            });
        }
    }

    outcome
}
