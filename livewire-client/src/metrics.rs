//! OpenTelemetry instruments for the call client
//!
//! Recorded only when the client was built with observability enabled
//! (`ClientBuilder::with_observability`). Instruments:
//!
//! - **livewire.client.connection.state**: gauge, see `ConnectionState::as_metric`
//! - **livewire.client.calls.total** / **livewire.client.call.duration**:
//!   per method, transport (`socket`/`http`) and status
//! - **livewire.client.errors.total**: per error kind
//! - **livewire.client.http.fallbacks**: socket calls retried over HTTP
//! - **livewire.client.reconnection.attempts** / **.success**
//! - **livewire.client.batch.size**
//! - **livewire.client.heartbeats.sent**

use livewire_core::{Error, ErrorKind};
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Transport a call went out on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Persistent socket
    Socket,
    /// One-shot HTTP POST
    Http,
}

impl Transport {
    /// Attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Socket => "socket",
            Transport::Http => "http",
        }
    }
}

/// Client metrics
pub struct ClientMetrics {
    connection_state: Gauge<i64>,
    calls_total: Counter<u64>,
    call_duration: Histogram<f64>,
    errors_total: Counter<u64>,
    http_fallbacks: Counter<u64>,
    reconnection_attempts: Counter<u64>,
    reconnection_success: Counter<u64>,
    batch_size: Histogram<u64>,
    heartbeats_sent: Counter<u64>,
}

impl ClientMetrics {
    /// Create instruments on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("livewire.client.connection.state")
                .with_description("Socket state (0=disconnected, 1=connecting, 2=connected, 3=reconnecting, 4=error)")
                .build(),
            calls_total: meter
                .u64_counter("livewire.client.calls.total")
                .with_description("Calls completed, by method, transport and status")
                .build(),
            call_duration: meter
                .f64_histogram("livewire.client.call.duration")
                .with_description("Call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("livewire.client.errors.total")
                .with_description("Failed calls by error kind")
                .build(),
            http_fallbacks: meter
                .u64_counter("livewire.client.http.fallbacks")
                .with_description("Socket calls retried over HTTP")
                .build(),
            reconnection_attempts: meter
                .u64_counter("livewire.client.reconnection.attempts")
                .with_description("Reconnection attempts scheduled")
                .build(),
            reconnection_success: meter
                .u64_counter("livewire.client.reconnection.success")
                .with_description("Reconnection attempts that opened the socket")
                .build(),
            batch_size: meter
                .u64_histogram("livewire.client.batch.size")
                .with_description("Entries per batch call")
                .build(),
            heartbeats_sent: meter
                .u64_counter("livewire.client.heartbeats.sent")
                .with_description("Heartbeat pings written to the socket")
                .build(),
        }
    }

    /// Record the current connection state code
    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    /// Record a finished call
    pub fn record_call(&self, method: &str, transport: Transport, result: Result<(), &Error>, duration_secs: f64) {
        let status = if result.is_ok() { "success" } else { "error" };
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("transport", transport.as_str()),
            KeyValue::new("status", status),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);

        if let Err(error) = result {
            self.record_error(error);
        }
    }

    /// Record a failed call by error kind
    pub fn record_error(&self, error: &Error) {
        let kind = match error.kind() {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Application => "timeout",
            ErrorKind::Local => "local",
        };
        self.errors_total.add(1, &[KeyValue::new("error_kind", kind)]);
    }

    /// Record a socket call retried over HTTP
    pub fn record_fallback(&self, method: &str) {
        self.http_fallbacks.add(1, &[KeyValue::new("method", method.to_string())]);
    }

    /// Record a scheduled reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    /// Record a batch call
    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    /// Record a heartbeat ping
    pub fn record_heartbeat(&self) {
        self.heartbeats_sent.add(1, &[]);
    }
}
