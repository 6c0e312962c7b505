//! Error types for livewire
//!
//! Two types live here:
//!
//! - **Error**: the single caller-facing error, derived with `thiserror`
//! - **JsonRpcErrorData**: the error object a server puts in a reply
//!
//! # Error Kinds
//!
//! Every [`Error`] falls in one [`ErrorKind`]:
//!
//! - **Transport**: the socket or HTTP exchange itself failed. These drive
//!   reconnection and transport fallback.
//! - **Protocol**: the peer answered, but with an error object or with
//!   something that does not decode.
//! - **Application**: the call was sent but no reply arrived in time.
//! - **Local**: the caller asked for something that cannot be sent.
//!
//! # Standard Error Codes
//!
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! # Examples
//!
//! ```rust
//! use livewire_core::{Error, ErrorKind, JsonRpcErrorData};
//!
//! let remote: Error = JsonRpcErrorData::method_not_found("common:nope").into();
//! assert_eq!(remote.kind(), ErrorKind::Protocol);
//!
//! assert!(Error::ConnectionClosed.is_transport());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for livewire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket or HTTP exchange failed
    Transport,
    /// Peer replied with an error object or an undecodable payload
    Protocol,
    /// No reply within the call timeout
    Application,
    /// The call could not be built or sent in the first place
    Local,
}

/// Application-level error type for livewire operations
///
/// Cloneable so a single teardown error can be fanned out to every call
/// still waiting on the socket.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Error object returned by the server
    #[error("RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport layer error
    ///
    /// Covers handshake failures, refused connections and failed frame writes.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Input/output error
    #[error("IO error: {0}")]
    Io(String),

    /// HTTP transport error
    ///
    /// Either a non-success status (`status` set) or a request that never
    /// produced a response (`status` is `None`).
    #[error("HTTP error: {}{reason}", status_prefix(.status))]
    Http {
        /// Response status, when one was received
        status: Option<u16>,
        /// Status text or underlying failure
        reason: String,
    },

    /// The socket is not open and the call may not open it
    #[error("Not connected")]
    NotConnected,

    /// The socket did not open within the connect timeout
    #[error("Connection timeout")]
    ConnectTimeout,

    /// Connection was closed while the call was in flight
    #[error("Connection closed")]
    ConnectionClosed,

    /// No reply arrived before the call timeout
    #[error("Request timeout: {method}")]
    Timeout {
        /// Method of the call that timed out
        method: String,
    },

    /// The server replied, but not with something the call can use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The call could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_prefix(status: &Option<u16>) -> String {
    status.map(|s| format!("{} ", s)).unwrap_or_default()
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::WebSocket(_)
            | Error::Io(_)
            | Error::Http { .. }
            | Error::NotConnected
            | Error::ConnectTimeout
            | Error::ConnectionClosed => ErrorKind::Transport,
            Error::JsonRpc(_) | Error::Serialization(_) | Error::InvalidResponse(_) => {
                ErrorKind::Protocol
            }
            Error::Timeout { .. } => ErrorKind::Application,
            Error::InvalidRequest(_) | Error::Internal(_) => ErrorKind::Local,
        }
    }

    /// True for errors raised by the socket or HTTP exchange
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Wire error code when the server returned an error object
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            Error::JsonRpc(data) => Some(data.code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// JSON-RPC 2.0 error object
///
/// Appears in the `error` field of a reply.
///
/// ```rust
/// use livewire_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::with_data(-32000, "Node offline", json!({"uuid": "n1"}));
/// assert_eq!(error.to_string(), "[-32000] Node offline");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i32,

    /// Short description
    pub message: String,

    /// Optional structured detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error carrying additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// Invalid request (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(-32600, msg)
    }

    /// Method not found (-32601)
    ///
    /// ```rust
    /// use livewire_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("common:getNodes");
    /// assert_eq!(error.message, "Method not found: common:getNodes");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(-32601, format!("Method not found: {}", method.into()))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(-32602, msg)
    }

    /// Internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(-32603, msg)
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}
