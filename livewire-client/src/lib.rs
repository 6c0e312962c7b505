//! Dual-transport JSON-RPC 2.0 client for the telemetry dashboard
//!
//! Calls go over one persistent WebSocket when it is open and fall back to
//! one-shot HTTP POSTs when it is not. The socket reconnects on its own
//! after an unexpected close, a bounded number of times.
//!
//! # Core Features
//!
//! - **Call correlation**: replies matched by id, in any order
//! - **Per-call timeouts**: configurable default, overridable per call
//! - **HTTP fallback**: one retry over HTTP when the socket call fails
//! - **Batch calls**: one HTTP POST, one result slot per request
//! - **Heartbeat**: `rpc.ping` notifications while connected
//! - **Events**: connect, disconnect, error, reconnecting, message
//! - **Observability**: OpenTelemetry metrics when enabled
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use livewire_client::{BatchRequest, CallOptions, ClientBuilder};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("http://localhost:8080/api/rpc2").build()?;
//!
//!     let status: Value = client
//!         .call("common:getNodesLatestStatus", (), CallOptions::default())
//!         .await?;
//!     println!("{}", status);
//!
//!     let mut batch = BatchRequest::new();
//!     batch.add_request("common:getNodes", json!({}));
//!     batch.add_request("common:getVersion", json!({}));
//!     let results = client.batch_call(batch).await?;
//!     println!("{} results", results.len());
//!
//!     client.disconnect().await;
//!     Ok(())
//! }
//! ```

mod batch;
mod client;
mod client_builder;
mod connection_state;
mod events;
mod http;
mod metrics;
mod reconnect;
mod request;
mod shared;

pub use batch::{BatchItem, BatchRequest, BatchResponse};
pub use client::{CallOptions, RpcClient, HEARTBEAT_METHOD};
pub use client_builder::{socket_url_for, ClientBuilder, ClientConfig, DEFAULT_RPC_PATH};
pub use connection_state::{ConnectionManager, ConnectionState};
pub use events::{ClientEvent, ClientEvents, ListenerId};
pub use http::HttpTransport;
pub use metrics::{ClientMetrics, Transport};
pub use reconnect::{FixedDelay, NoReconnect, ReconnectionStrategy};
pub use request::RequestManager;
pub use shared::SharedClient;
