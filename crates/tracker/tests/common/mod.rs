#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use karaoke_core::job::{CreatedJob, JobStatusReport};
use karaoke_core::types::JobId;
use tokio::sync::Notify;
use tokio::time::Instant;

use karaoke_tracker::config::TrackerConfig;
use karaoke_tracker::service::{JobService, ServiceError};
use karaoke_tracker::sink::PresentationSink;
use karaoke_tracker::tracker::JobTracker;
use karaoke_tracker::TrackerEvent;

/// One scripted response from the fake job service.
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond immediately with this JSON body.
    Reply(&'static str),
    /// Respond with this JSON body after a delay.
    Delayed(Duration, &'static str),
    /// Fail with a 503.
    Fail,
    /// Never respond.
    Hang,
}

/// In-memory job service driven by scripted responses.
///
/// When the status script runs dry it keeps answering `running`.
pub struct ScriptedService {
    creates: Mutex<VecDeque<Step>>,
    polls: Mutex<VecDeque<Step>>,
    create_calls: AtomicUsize,
    polled: Mutex<Vec<(JobId, Instant)>>,
}

impl ScriptedService {
    pub fn new(creates: Vec<Step>, polls: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            creates: Mutex::new(creates.into()),
            polls: Mutex::new(polls.into()),
            create_calls: AtomicUsize::new(0),
            polled: Mutex::new(Vec::new()),
        })
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.polled.lock().unwrap().len()
    }

    /// Instants at which status was requested.
    pub fn poll_times(&self) -> Vec<Instant> {
        self.polled.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn polled_ids(&self) -> Vec<JobId> {
        self.polled.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    async fn play<T: serde::de::DeserializeOwned>(step: Step) -> Result<T, ServiceError> {
        let body = match step {
            Step::Reply(body) => body,
            Step::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                body
            }
            Step::Fail => {
                return Err(ServiceError::Api {
                    status: 503,
                    body: "service unavailable".into(),
                })
            }
            Step::Hang => std::future::pending().await,
        };
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl JobService for ScriptedService {
    async fn create_job(&self, _source: &str) -> Result<CreatedJob, ServiceError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Fail);
        Self::play(step).await
    }

    async fn get_job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ServiceError> {
        self.polled
            .lock()
            .unwrap()
            .push((job_id.clone(), Instant::now()));
        let step = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Reply(RUNNING));
        Self::play(step).await
    }
}

/// Sink that records every event in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TrackerEvent>>,
    changed: Notify,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&TrackerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    /// Wait (in virtual time) until a final event has been recorded.
    pub async fn wait_for_final(&self) {
        self.wait_until(|events| events.iter().any(TrackerEvent::is_final))
            .await;
    }

    pub async fn wait_until(&self, cond: impl Fn(&[TrackerEvent]) -> bool) {
        let wait = async {
            loop {
                if cond(&self.events.lock().unwrap()) {
                    return;
                }
                self.changed.notified().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(600), wait)
            .await
            .expect("timed out waiting for tracker events");
    }
}

impl PresentationSink for RecordingSink {
    fn notify(&self, event: TrackerEvent) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_one();
    }
}

pub fn tracker(service: &Arc<ScriptedService>, sink: &Arc<RecordingSink>) -> JobTracker {
    tracker_with(service, sink, TrackerConfig::default())
}

pub fn tracker_with(
    service: &Arc<ScriptedService>,
    sink: &Arc<RecordingSink>,
    config: TrackerConfig,
) -> JobTracker {
    JobTracker::new(service.clone(), sink.clone(), config)
}

pub const CREATED_J1: &str = r#"{"job_id":"j1","stages":{"download":{"status":"pending"}}}"#;

pub const CREATED_J2: &str =
    r#"{"job_id":"j2","status":"pending","stages":{"download":{"status":"pending"}}}"#;

pub const RUNNING: &str = r#"{"status":"running","stages":{"download":{"status":"completed"},"align":{"status":"running"}}}"#;

pub const COMPLETED: &str = r#"{"status":"completed","stages":{"download":{"status":"completed"},"align":{"status":"completed"}}}"#;
