//! Feed configuration

use livewire_client::socket_url_for;
use livewire_core::{Error, Result};
use std::time::Duration;

/// Default path of the push stream
pub const DEFAULT_PUSH_PATH: &str = "/api/clients";

/// Default method polled in pull mode
pub const DEFAULT_STATUS_METHOD: &str = "common:getNodesLatestStatus";

/// Options of a [`FeedCoordinator`](crate::FeedCoordinator)
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Push stream URL
    pub push_url: String,
    /// Pause between the end of one pull and the start of the next. Default: 2 s
    pub pull_interval: Duration,
    /// Consecutive pull failures that switch the feed to push. Default: 3
    pub failure_threshold: u32,
    /// Keep-alive period on the push stream. Default: 2 s
    pub keepalive_interval: Duration,
    /// Delay before reopening a closed push stream. Default: 2 s
    pub push_reconnect_delay: Duration,
    /// Method polled in pull mode
    pub status_method: String,
}

impl FeedConfig {
    /// Defaults with an explicit push stream URL
    pub fn new(push_url: impl Into<String>) -> Self {
        Self {
            push_url: push_url.into(),
            pull_interval: Duration::from_millis(2000),
            failure_threshold: 3,
            keepalive_interval: Duration::from_millis(2000),
            push_reconnect_delay: Duration::from_millis(2000),
            status_method: DEFAULT_STATUS_METHOD.to_string(),
        }
    }

    /// Defaults for a server at `base_url` (`http://host:port`)
    ///
    /// The push stream is at [`DEFAULT_PUSH_PATH`] on the same host.
    pub fn for_server(base_url: &str) -> Self {
        let base = socket_url_for(base_url.trim_end_matches('/'));
        Self::new(format!("{}{}", base, DEFAULT_PUSH_PATH))
    }

    /// Set the wait between the end of one pull and the next
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }

    /// Set how many consecutive pull failures switch the feed to push
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the keep-alive period on the push stream
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set the delay before reopening a closed push stream
    pub fn with_push_reconnect_delay(mut self, delay: Duration) -> Self {
        self.push_reconnect_delay = delay;
        self
    }

    /// Set the method polled in pull mode
    pub fn with_status_method(mut self, method: impl Into<String>) -> Self {
        self.status_method = method.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(Error::InvalidRequest("failure_threshold must be at least 1".into()));
        }
        if self.keepalive_interval.is_zero() {
            return Err(Error::InvalidRequest("keepalive_interval must be non-zero".into()));
        }
        if self.push_url.is_empty() {
            return Err(Error::InvalidRequest("push_url is required".into()));
        }
        Ok(())
    }
}
