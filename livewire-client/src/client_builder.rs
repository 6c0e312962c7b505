//! Client configuration and builder
//!
//! Every option has an explicit default, listed on [`ClientConfig`]. The
//! builder takes the HTTP endpoint of the RPC service and derives the
//! socket URL from it (`http` → `ws`, `https` → `wss`, same host and path)
//! unless [`ClientBuilder::socket_url`] overrides it.
//!
//! ```rust,no_run
//! use livewire_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> livewire_core::Result<()> {
//! let client = ClientBuilder::new("https://status.example.com/api/rpc2")
//!     .request_timeout(Duration::from_secs(10))
//!     .max_reconnect_attempts(3)
//!     .with_default_observability()
//!     .service_name("status-dashboard")
//!     .build()?;
//!
//! assert_eq!(client.socket_url(), "wss://status.example.com/api/rpc2");
//! # Ok(())
//! # }
//! ```

use crate::client::RpcClient;
use livewire_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Default RPC path on the telemetry server
pub const DEFAULT_RPC_PATH: &str = "/api/rpc2";

/// Call client options
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Open the socket when the client is built, and whenever a socket
    /// call finds it closed. Default: true
    pub auto_connect: bool,
    /// Retry after an unexpected close. Default: true
    pub auto_reconnect: bool,
    /// Delay between retries. Default: 3 s
    pub reconnect_interval: Duration,
    /// Retries before settling in `Disconnected`. Default: 5
    pub max_reconnect_attempts: u32,
    /// Per-call reply deadline, overridable per call. Default: 30 s
    pub request_timeout: Duration,
    /// Send `rpc.ping` while connected. Default: true
    pub enable_heartbeat: bool,
    /// Heartbeat period. Default: 15 s
    pub heartbeat_interval: Duration,
    /// Retry failed socket calls once over HTTP. Default: true
    pub enable_http_fallback: bool,
    /// Socket open deadline. Default: 10 s
    pub connect_timeout: Duration,
    /// Extra headers for HTTP calls, besides `Content-Type`
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auto_connect: true,
            auto_reconnect: true,
            reconnect_interval: Duration::from_millis(3000),
            max_reconnect_attempts: 5,
            request_timeout: Duration::from_millis(30_000),
            enable_heartbeat: true,
            heartbeat_interval: Duration::from_millis(15_000),
            enable_http_fallback: true,
            connect_timeout: Duration::from_millis(10_000),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    fn validate(&self) -> Result<()> {
        if self.enable_heartbeat && self.heartbeat_interval.is_zero() {
            return Err(Error::InvalidRequest("heartbeat_interval must be non-zero".into()));
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(Error::InvalidRequest("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Derive the socket URL from the HTTP endpoint
///
/// URLs that already use `ws`/`wss`, or any other scheme, are kept as is.
pub fn socket_url_for(http_url: &str) -> String {
    if let Some(rest) = http_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = http_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        http_url.to_string()
    }
}

/// Builder for [`RpcClient`]
pub struct ClientBuilder {
    http_url: String,
    socket_url: Option<String>,
    config: ClientConfig,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Start from the HTTP endpoint of the RPC service
    pub fn new(http_url: impl Into<String>) -> Self {
        Self {
            http_url: http_url.into(),
            socket_url: None,
            config: ClientConfig::default(),
            observability_config: None,
            service_name: None,
        }
    }

    /// Use an explicit socket URL instead of deriving it
    pub fn socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = Some(url.into());
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// See [`ClientConfig::auto_connect`]
    pub fn auto_connect(mut self, enable: bool) -> Self {
        self.config.auto_connect = enable;
        self
    }

    /// See [`ClientConfig::auto_reconnect`]
    pub fn auto_reconnect(mut self, enable: bool) -> Self {
        self.config.auto_reconnect = enable;
        self
    }

    /// See [`ClientConfig::reconnect_interval`]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.config.reconnect_interval = interval;
        self
    }

    /// See [`ClientConfig::max_reconnect_attempts`]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    /// See [`ClientConfig::request_timeout`]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// See [`ClientConfig::enable_heartbeat`]
    pub fn heartbeat(mut self, enable: bool) -> Self {
        self.config.enable_heartbeat = enable;
        self
    }

    /// See [`ClientConfig::heartbeat_interval`]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// See [`ClientConfig::enable_http_fallback`]
    pub fn http_fallback(mut self, enable: bool) -> Self {
        self.config.enable_http_fallback = enable;
        self
    }

    /// See [`ClientConfig::connect_timeout`]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Add a header to every HTTP call
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Initialize observability and record client metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Same as [`with_observability`](Self::with_observability) with defaults
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Service name for telemetry, used if observability is enabled
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client
    ///
    /// With `auto_connect` the socket starts opening in the background when
    /// called inside a tokio runtime; failures there are logged and the
    /// next socket call tries again.
    pub fn build(self) -> Result<RpcClient> {
        self.config.validate()?;

        let metrics = match self.observability_config {
            Some(mut config) => {
                if let Some(name) = self.service_name {
                    config.service_name = name;
                }
                livewire_core::init_observability(config.clone()).map_err(|e| {
                    Error::Internal(format!("Failed to initialize observability: {}", e))
                })?;
                Some(Arc::new(crate::ClientMetrics::new(config.service_name)))
            }
            None => None,
        };

        let socket_url = self
            .socket_url
            .unwrap_or_else(|| socket_url_for(&self.http_url));
        let client = RpcClient::new(self.config, self.http_url, socket_url, metrics)?;

        if client.config().auto_connect {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let background = client.clone();
                    let epoch = client.epoch();
                    handle.spawn(async move {
                        if let Err(e) = background.connect_unless_disconnected(epoch).await {
                            tracing::warn!(error = %e, "Initial connect failed");
                        }
                    });
                }
                Err(_) => tracing::debug!("No runtime at build time, connecting on first call"),
            }
        }

        Ok(client)
    }
}
