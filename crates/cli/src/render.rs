//! Terminal rendering of tracker events.

use karaoke_core::job::{DownloadReference, StageMap};
use karaoke_core::stages::stage_label;
use karaoke_tracker::TrackerEvent;

/// Width of the status column, wide enough for `completed`.
const STATUS_WIDTH: usize = 9;

/// Lines to print for one event.
///
/// `resolve` turns a download reference into something the user can open.
pub fn format_event(event: &TrackerEvent, resolve: impl Fn(&DownloadReference) -> String) -> Vec<String> {
    match event {
        TrackerEvent::JobCreated { job_id, stages, .. } => {
            let mut lines = vec![format!("Job {job_id} created. Running pipeline...")];
            lines.extend(format_stages(stages));
            lines
        }
        TrackerEvent::StatusUpdated { status, stages, .. } => {
            let mut lines = vec![format!("Status: {status}")];
            lines.extend(format_stages(stages));
            lines
        }
        TrackerEvent::JobCompleted { download, .. } => vec![
            "Karaoke video is ready!".to_string(),
            format!("Download: {}", resolve(download)),
        ],
        TrackerEvent::JobFailed { error, .. } => vec![format!("Failed: {error}")],
        TrackerEvent::SubmissionFailed { reason, .. } => {
            vec![format!("Failed to create job: {reason}")]
        }
        TrackerEvent::PollingAbandoned { job_id, reason } => vec![format!(
            "Lost contact with job {job_id} ({reason}). It may still be running."
        )],
    }
}

fn format_stages(stages: &StageMap) -> Vec<String> {
    stages
        .iter()
        .map(|(name, stage)| {
            format!(
                "  [{:<width$}] {}",
                stage.status,
                stage_label(name),
                width = STATUS_WIDTH
            )
        })
        .collect()
}
