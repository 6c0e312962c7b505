//! Core types for livewire
//!
//! Shared by the call client and the feed coordinator:
//!
//! - **Types**: JSON-RPC 2.0 envelopes
//! - **Codec**: frame encoding and reply extraction
//! - **Error handling**: the single [`Error`] type and its [`ErrorKind`]
//! - **Observability**: `tracing` subscriber and OpenTelemetry bootstrap
//!
//! The crate is transport-agnostic; `livewire-client` moves these envelopes
//! over a WebSocket or HTTP POST.
//!
//! ```rust
//! use livewire_core::{codec, Id, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("common:getNodesLatestStatus", None, Id::Number(1));
//! let text = codec::encode(&request).unwrap();
//!
//! let reply = codec::decode_response(r#"{"jsonrpc":"2.0","result":{},"id":1}"#).unwrap();
//! assert_eq!(reply.id, request.id);
//! # let _ = text;
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

pub use error::{Error, ErrorKind, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, JsonRpcCall, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
