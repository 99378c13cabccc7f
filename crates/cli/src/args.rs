use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use karaoke_tracker::config::TrackerConfig;

#[derive(Debug, Parser)]
#[command(name = "karaoke", about = "Turn a video URL into a karaoke video")]
pub struct Cli {
    /// Video URL to convert
    pub url: String,

    /// Job service base URL (overrides KARAOKE_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Milliseconds between status polls (overrides KARAOKE_POLL_INTERVAL_MS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Per-request timeout in seconds (overrides KARAOKE_REQUEST_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Stop polling after this many consecutive failures
    /// (overrides KARAOKE_MAX_POLL_FAILURES)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_poll_failures: Option<u32>,

    /// Download the finished video to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also log every tracker event as a structured tracing record
    #[arg(long)]
    pub log_events: bool,
}

impl Cli {
    /// Layer command-line flags over environment configuration.
    pub fn apply_overrides(&self, mut config: TrackerConfig) -> TrackerConfig {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
            config.retry.initial_delay = config.poll_interval;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_poll_failures {
            config.retry.max_consecutive_failures = Some(max);
        }
        config
    }
}
