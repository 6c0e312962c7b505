//! JSON-RPC 2.0 envelopes exchanged with the telemetry backend
//!
//! The same envelopes travel over both transports: as text frames on the
//! persistent socket and as the body of an HTTP POST. A call that expects a
//! reply carries an [`Id`]; a notification carries none and is never
//! answered.
//!
//! # Request IDs
//!
//! The client numbers its calls with a monotonically increasing integer, but
//! servers are free to echo string ids, so both shapes decode. `null` only
//! shows up in error replies for requests the server could not parse.

use crate::error::{Error, JsonRpcErrorData, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Protocol version tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// JSON-RPC 2.0 request ID
///
/// Serialized untagged so it appears on the wire as a bare number or string.
/// Implements `Hash` and `Eq` so it can key the correlation table.
///
/// # Examples
///
/// ```rust
/// use livewire_core::Id;
///
/// let numeric: Id = 7u64.into();
/// let named: Id = "probe".into();
///
/// assert_eq!(numeric.to_string(), "7");
/// assert_eq!(named.to_string(), "\"probe\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Numeric identifier, the shape the client generates
    Number(i64),
    /// Null identifier, only seen on unparseable-request errors
    Null,
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    /// Ids above `i64::MAX` wrap; the client counter never gets there.
    fn from(n: u64) -> Self {
        Id::Number(n as i64)
    }
}

/// A call that expects a reply
///
/// `params` is omitted from the encoded form when absent, which is how a
/// call made with no (or null) parameters goes out on the wire.
///
/// # Examples
///
/// ```rust
/// use livewire_core::{Id, JsonRpcRequest};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new(
///     "common:getNodesLatestStatus",
///     None,
///     Id::Number(1),
/// );
/// assert_eq!(req.jsonrpc, "2.0");
///
/// let with_params = JsonRpcRequest::new("common:getRecords", Some(json!({"uuid": "n1"})), 2u64.into());
/// assert!(with_params.params.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Remote method name, for example `common:getNodesLatestStatus`
    pub method: String,
    /// Optional parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Correlation id echoed back by the server
    pub id: Id,
}

impl JsonRpcRequest {
    /// Create a new request envelope
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Id) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// A fire-and-forget call
///
/// Has no `id` field, so the server sends nothing back and the client keeps
/// no correlation entry for it. The heartbeat `rpc.ping` is one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Remote method name
    pub method: String,
    /// Optional parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification envelope
    ///
    /// ```rust
    /// use livewire_core::JsonRpcNotification;
    /// use serde_json::json;
    ///
    /// let ping = JsonRpcNotification::new("rpc.ping", Some(json!({"timestamp": 0})));
    /// assert_eq!(ping.method, "rpc.ping");
    /// ```
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
        }
    }
}

/// Reply to a [`JsonRpcRequest`]
///
/// Exactly one of `result` or `error` is expected. Servers that answer with
/// `"result": null` decode as a success carrying `Value::Null`, and the
/// version tag is filled in when a server leaves it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Present on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Present on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    /// Id of the request being answered
    pub id: Id,
}

impl JsonRpcResponse {
    /// Create a successful reply
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: default_version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error reply
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: default_version(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// True when the reply carries no error object
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when the reply carries an error object
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Convert the reply into the caller-facing result
    ///
    /// An error object becomes [`Error::JsonRpc`]; a missing result becomes
    /// `Value::Null`.
    ///
    /// ```rust
    /// use livewire_core::{Error, Id, JsonRpcErrorData, JsonRpcResponse};
    /// use serde_json::json;
    ///
    /// let ok = JsonRpcResponse::success(json!(3), Id::Number(1));
    /// assert_eq!(ok.into_result().unwrap(), json!(3));
    ///
    /// let failed = JsonRpcResponse::error(JsonRpcErrorData::method_not_found("x"), Id::Number(2));
    /// assert!(matches!(failed.into_result(), Err(Error::JsonRpc(_))));
    /// ```
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::JsonRpc(error)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Outbound envelope: either a correlated request or a notification
///
/// Batches are a JSON array of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcCall {
    /// Expects a reply
    Request(JsonRpcRequest),
    /// Expects nothing
    Notification(JsonRpcNotification),
}

impl JsonRpcCall {
    /// Method name of the wrapped envelope
    pub fn method(&self) -> &str {
        match self {
            JsonRpcCall::Request(req) => &req.method,
            JsonRpcCall::Notification(notif) => &notif.method,
        }
    }

    /// Correlation id, `None` for notifications
    pub fn id(&self) -> Option<&Id> {
        match self {
            JsonRpcCall::Request(req) => Some(&req.id),
            JsonRpcCall::Notification(_) => None,
        }
    }

    /// Check if this envelope is a notification
    pub fn is_notification(&self) -> bool {
        matches!(self, JsonRpcCall::Notification(_))
    }
}

impl From<JsonRpcRequest> for JsonRpcCall {
    fn from(req: JsonRpcRequest) -> Self {
        JsonRpcCall::Request(req)
    }
}

impl From<JsonRpcNotification> for JsonRpcCall {
    fn from(notif: JsonRpcNotification) -> Self {
        JsonRpcCall::Notification(notif)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("node".to_string()).to_string(), "\"node\"");
        assert_eq!(Id::Number(42).to_string(), "42");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_request_omits_absent_params() {
        let req = JsonRpcRequest::new("common:getNodes", None, Id::Number(1));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"common:getNodes\""));
        assert!(json.contains("\"id\":1"));
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_notification_has_no_id() {
        let notif = JsonRpcNotification::new("rpc.ping", Some(json!({"timestamp": 1})));
        let json = serde_json::to_string(&notif).unwrap();
        assert!(json.contains("\"method\":\"rpc.ping\""));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_response_with_null_result_is_success() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":null,"id":3}"#).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn test_response_without_version_decodes() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"result":1,"id":"a"}"#).unwrap();
        assert_eq!(resp.jsonrpc, "2.0");
        assert_eq!(resp.id, Id::String("a".into()));
    }

    #[test]
    fn test_response_error_into_result() {
        let resp = JsonRpcResponse::error(JsonRpcErrorData::internal_error("boom"), Id::Number(1));
        assert!(resp.is_error());
        match resp.into_result() {
            Err(Error::JsonRpc(data)) => assert_eq!(data.code, -32603),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_call_accessors() {
        let req: JsonRpcCall = JsonRpcRequest::new("a", None, Id::Number(9)).into();
        let notif: JsonRpcCall = JsonRpcNotification::new("b", None).into();

        assert_eq!(req.method(), "a");
        assert_eq!(req.id(), Some(&Id::Number(9)));
        assert!(!req.is_notification());
        assert_eq!(notif.id(), None);
        assert!(notif.is_notification());
    }
}
