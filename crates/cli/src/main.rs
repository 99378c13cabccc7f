//! `karaoke` -- submit a video to the karaoke pipeline and follow it.
//!
//! Creates a job on the job service, prints stage progress on every
//! poll, and prints (or downloads) the finished video.
//!
//! # Environment variables
//!
//! | Variable                       | Default                     |
//! |--------------------------------|-----------------------------|
//! | `KARAOKE_API_URL`              | `http://localhost:8000/api` |
//! | `KARAOKE_POLL_INTERVAL_MS`     | `2000`                      |
//! | `KARAOKE_REQUEST_TIMEOUT_SECS` | `30`                        |
//! | `KARAOKE_MAX_POLL_FAILURES`    | unset (retry forever)       |
//! | `KARAOKE_BACKOFF_MAX_SECS`     | `30`                        |
//!
//! Command-line flags take precedence over the environment.

mod args;
mod render;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use karaoke_core::types::JobId;
use karaoke_tracker::api::JobServiceApi;
use karaoke_tracker::config::TrackerConfig;
use karaoke_tracker::sink::{BroadcastSink, TracingSink};
use karaoke_tracker::{JobTracker, PresentationSink, TrackerError, TrackerEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;

/// How tracking of the submitted job ended.
enum Outcome {
    Completed(JobId),
    Failed,
    Cancelled,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "karaoke_cli=info,karaoke_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.apply_overrides(TrackerConfig::from_env()?);
    let api = Arc::new(JobServiceApi::new(config.api_url.clone()));

    tracing::info!(
        api_url = %api.api_url(),
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        request_timeout_secs = config.request_timeout.as_secs(),
        "Starting karaoke client",
    );

    let event_log = cli.log_events.then_some(TracingSink);
    let sink = Arc::new(BroadcastSink::default());
    let mut events = sink.subscribe();
    let tracker = JobTracker::new(api.clone(), sink, config);

    match tracker.submit(&cli.url).await {
        Ok(_) => {}
        Err(TrackerError::InvalidInput(msg)) => {
            eprintln!("Please enter a video URL ({msg})");
            return Ok(ExitCode::FAILURE);
        }
        Err(TrackerError::Service(_)) => {
            // The SubmissionFailed event below carries the reason.
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracker.cancel().await;
                eprintln!("Cancelled.");
                break Outcome::Cancelled;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Some(log) = &event_log {
                        log.notify(event.clone());
                    }
                    for line in render::format_event(&event, |r| api.resolve(r)) {
                        println!("{line}");
                    }
                    match event {
                        TrackerEvent::JobCompleted { job_id, .. } => break Outcome::Completed(job_id),
                        e if e.is_final() => break Outcome::Failed,
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Display fell behind, skipped updates");
                }
                Err(RecvError::Closed) => break Outcome::Failed,
            },
        }
    };

    match outcome {
        Outcome::Completed(job_id) => {
            if let Some(path) = &cli.output {
                let bytes = api
                    .fetch_download(&job_id, path)
                    .await
                    .with_context(|| format!("Failed to download video to {}", path.display()))?;
                println!("Saved {} ({bytes} bytes)", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failed | Outcome::Cancelled => Ok(ExitCode::FAILURE),
    }
}
