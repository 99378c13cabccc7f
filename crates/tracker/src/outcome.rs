//! Interpretation of a fetched status report.
//!
//! Decides whether a poll result ends tracking. An error message wins
//! over a `completed` status when both are present, so a job produces
//! at most one terminal outcome.

use karaoke_core::job::{JobStatus, JobStatusReport};

/// Message used when the service reports an errored status without text.
pub const GENERIC_FAILURE_MESSAGE: &str = "job failed";

/// What the tracker should do after applying a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Keep polling.
    Continue,
    /// The job finished successfully.
    Completed,
    /// The pipeline reported a failure.
    Failed(String),
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Classify a status report.
pub fn interpret(report: &JobStatusReport) -> PollOutcome {
    if let Some(msg) = report.error_message() {
        return PollOutcome::Failed(msg.to_string());
    }
    match &report.status {
        JobStatus::Completed => PollOutcome::Completed,
        status if status.is_terminal() => {
            PollOutcome::Failed(GENERIC_FAILURE_MESSAGE.to_string())
        }
        _ => PollOutcome::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(json: &str) -> JobStatusReport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn running_continues() {
        let r = report(r#"{"status":"running","stages":{"download":{"status":"running"}}}"#);
        assert_eq!(interpret(&r), PollOutcome::Continue);
    }

    #[test]
    fn pending_continues() {
        assert_eq!(interpret(&report(r#"{"status":"pending"}"#)), PollOutcome::Continue);
    }

    #[test]
    fn completed_is_terminal() {
        let outcome = interpret(&report(r#"{"status":"completed"}"#));
        assert_eq!(outcome, PollOutcome::Completed);
        assert!(outcome.is_terminal());
    }

    #[test]
    fn error_field_fails_regardless_of_status() {
        let r = report(r#"{"status":"running","stages":{},"error":"disk full"}"#);
        assert_eq!(interpret(&r), PollOutcome::Failed("disk full".into()));
    }

    #[test]
    fn error_takes_priority_over_completed() {
        let r = report(r#"{"status":"completed","error":"mux failed"}"#);
        assert_eq!(interpret(&r), PollOutcome::Failed("mux failed".into()));
    }

    #[test]
    fn errored_status_without_message_fails_generically() {
        let r = report(r#"{"status":"failed","error":null}"#);
        assert_eq!(
            interpret(&r),
            PollOutcome::Failed(GENERIC_FAILURE_MESSAGE.into())
        );
    }

    #[test]
    fn errored_spelling_without_message_fails_generically() {
        let r = report(r#"{"status":"errored"}"#);
        assert_eq!(
            interpret(&r),
            PollOutcome::Failed(GENERIC_FAILURE_MESSAGE.into())
        );
    }

    #[test]
    fn unknown_status_continues() {
        assert_eq!(interpret(&report(r#"{"status":"queued"}"#)), PollOutcome::Continue);
    }

    #[test]
    fn stage_failure_alone_is_not_terminal() {
        let r = report(r#"{"status":"running","stages":{"merge":{"status":"failed"}}}"#);
        assert_eq!(interpret(&r), PollOutcome::Continue);
    }
}
