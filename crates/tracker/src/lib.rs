//! Client-side tracker for karaoke pipeline jobs.
//!
//! Submits a source video to the job service, polls the job until it
//! completes or fails, and reports every state change to a
//! [`PresentationSink`](sink::PresentationSink). Also provides the HTTP
//! binding for the job service, retry/backoff policy, and configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod outcome;
pub mod poller;
pub mod retry;
pub mod service;
pub mod sink;
pub mod tracker;

pub use error::TrackerError;
pub use events::TrackerEvent;
pub use service::{JobService, ServiceError};
pub use sink::PresentationSink;
pub use tracker::{JobTracker, TrackerState};
