//! Encoding and decoding of JSON-RPC frames
//!
//! Outbound envelopes are plain serde encodes. Inbound text is first parsed
//! to a `serde_json::Value` so the same raw value can be surfaced to message
//! listeners and then scanned for replies. A reply frame may be a single
//! object or an array (batch reply). Array items that are not replies are
//! skipped instead of failing the whole frame.
//!
//! # Examples
//!
//! ```rust
//! use livewire_core::{codec, Id, JsonRpcRequest};
//!
//! let request = JsonRpcRequest::new("common:getNodes", None, Id::Number(1));
//! let text = codec::encode(&request).unwrap();
//! assert!(text.contains("\"id\":1"));
//!
//! let replies = codec::decode_responses(r#"[{"jsonrpc":"2.0","result":1,"id":1}]"#).unwrap();
//! assert_eq!(replies.len(), 1);
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcCall, JsonRpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Encode any serializable envelope to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a batch of calls as one JSON array
///
/// An empty batch is rejected since servers answer it with a single
/// invalid-request error instead of an array.
pub fn encode_batch(calls: &[JsonRpcCall]) -> Result<String> {
    if calls.is_empty() {
        return Err(Error::InvalidRequest("Batch cannot be empty".into()));
    }
    encode(&calls)
}

/// Parse inbound text into a raw JSON value
///
/// Invalid JSON maps to a parse error (-32700).
pub fn decode_value(data: &str) -> Result<Value> {
    serde_json::from_str(data).map_err(|_e| Error::JsonRpc(JsonRpcErrorData::parse_error()))
}

/// Decode a JSON string to a specific type
pub fn decode_as<'de, T: Deserialize<'de>>(data: &'de str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a single reply object
pub fn decode_response(data: &str) -> Result<JsonRpcResponse> {
    decode_as(data)
}

/// Extract every reply carried by an already-parsed frame
///
/// Objects that do not look like replies (no `result`/`error`, or no `id`)
/// are ignored, so server-pushed notifications on the same socket do not
/// disturb correlation.
pub fn responses_from_value(value: &Value) -> Vec<JsonRpcResponse> {
    match value {
        Value::Array(items) => items.iter().filter_map(response_from_object).collect(),
        Value::Object(_) => response_from_object(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Parse text and extract every reply in it
///
/// Unlike [`responses_from_value`] this fails on invalid JSON.
pub fn decode_responses(data: &str) -> Result<Vec<JsonRpcResponse>> {
    let value = decode_value(data)?;
    Ok(responses_from_value(&value))
}

fn response_from_object(value: &Value) -> Option<JsonRpcResponse> {
    let obj = value.as_object()?;
    if !obj.contains_key("id") || !(obj.contains_key("result") || obj.contains_key("error")) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
