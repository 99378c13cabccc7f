//! Presentation sinks: where tracker notifications go.
//!
//! A sink only receives owned [`TrackerEvent`] values and has no way to
//! influence the tracker. [`BroadcastSink`] fans events out to any number
//! of async consumers; [`TracingSink`] writes them to the log.

use tokio::sync::broadcast;

use crate::events::TrackerEvent;

/// Receiver of tracker notifications.
///
/// Calls are fire-and-forget and happen while the tracker holds its
/// session lock, so implementations must not block.
pub trait PresentationSink: Send + Sync {
    fn notify(&self, event: TrackerEvent);
}

// ---------------------------------------------------------------------------
// BroadcastSink
// ---------------------------------------------------------------------------

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out sink backed by a [`broadcast`] channel.
///
/// When the buffer is full, the oldest unconsumed events are dropped and
/// slow receivers observe `RecvError::Lagged`.
pub struct BroadcastSink {
    sender: broadcast::Sender<TrackerEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl PresentationSink for BroadcastSink {
    fn notify(&self, event: TrackerEvent) {
        // Only fails when nobody is subscribed.
        let _ = self.sender.send(event);
    }
}

// ---------------------------------------------------------------------------
// TracingSink
// ---------------------------------------------------------------------------

/// Sink that logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn notify(&self, event: TrackerEvent) {
        match &event {
            TrackerEvent::JobCreated { job_id, status, stages } => {
                tracing::info!(job_id = %job_id, status = %status, stages = stages.len(), "Job created");
            }
            TrackerEvent::StatusUpdated { job_id, status, stages } => {
                let running: Vec<&str> = stages
                    .iter()
                    .filter(|(_, stage)| stage.status == "running")
                    .map(|(name, _)| name.as_str())
                    .collect();
                tracing::debug!(job_id = %job_id, status = %status, ?running, "Job status updated");
            }
            TrackerEvent::JobCompleted { job_id, download } => {
                tracing::info!(job_id = %job_id, download = %download, "Job completed");
            }
            TrackerEvent::JobFailed { job_id, error } => {
                tracing::error!(job_id = %job_id, error = %error, "Job failed");
            }
            TrackerEvent::SubmissionFailed { source, reason } => {
                tracing::error!(source = %source, reason = %reason, "Job submission failed");
            }
            TrackerEvent::PollingAbandoned { job_id, reason } => {
                tracing::warn!(job_id = %job_id, reason = %reason, "Stopped polling job");
            }
        }
    }
}
