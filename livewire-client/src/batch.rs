//! Batch calls over HTTP
//!
//! A batch is sent as one JSON array in a single POST. Entries marked as
//! notifications get no reply and take no slot in the result; every other
//! entry gets one slot, in the order it was added, regardless of the order
//! the server answers in.
//!
//! Each slot is its own `Result`: one failing entry does not hide the
//! results of the others. [`BatchResponse::into_values`] gives the
//! all-or-nothing view when that is what the caller wants.
//!
//! ```rust,no_run
//! use livewire_client::{BatchRequest, RpcClient};
//! use serde_json::json;
//!
//! # async fn example(client: &RpcClient) -> livewire_core::Result<()> {
//! let mut batch = BatchRequest::new();
//! batch.add_request("common:getNodes", ());
//! batch.add_notification("common:touch", json!({"uuid": "n1"}));
//! batch.add_request("common:getRecords", json!({"uuid": "n1", "hours": 1}));
//!
//! let responses = client.batch_call(batch).await?;
//! assert_eq!(responses.len(), 2);
//! let nodes: serde_json::Value = responses.get(0)?;
//! # let _ = nodes;
//! # Ok(())
//! # }
//! ```

use crate::request::{id_to_key, RequestManager};
use livewire_core::{
    Error, Id, JsonRpcCall, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct BatchEntry {
    method: String,
    params: Option<Value>,
    notification: bool,
}

/// Builder for a batch of calls
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    entries: Vec<BatchEntry>,
}

impl BatchRequest {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a call that expects a reply
    ///
    /// Returns the slot its result will occupy in the [`BatchResponse`].
    pub fn add_request<P: Serialize>(&mut self, method: impl Into<String>, params: P) -> usize {
        self.push(method.into(), params, false);
        self.request_count() - 1
    }

    /// Add a notification; it gets no slot in the response
    pub fn add_notification<P: Serialize>(&mut self, method: impl Into<String>, params: P) {
        self.push(method.into(), params, true);
    }

    fn push<P: Serialize>(&mut self, method: String, params: P, notification: bool) {
        // Null or unit params are omitted from the envelope.
        let params = serde_json::to_value(params).ok().filter(|v| !v.is_null());
        self.entries.push(BatchEntry {
            method,
            params,
            notification,
        });
    }

    /// Total number of entries, notifications included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that expect a reply
    pub fn request_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.notification).count()
    }

    /// Assign ids and build the wire envelopes
    ///
    /// Also returns `(id, method)` for every reply-expecting entry, in
    /// submission order.
    pub(crate) fn prepare(&self, ids: &RequestManager) -> (Vec<JsonRpcCall>, Vec<(Id, String)>) {
        let mut calls = Vec::with_capacity(self.entries.len());
        let mut expected = Vec::new();

        for entry in &self.entries {
            if entry.notification {
                calls.push(JsonRpcNotification::new(entry.method.clone(), entry.params.clone()).into());
            } else {
                let id = ids.next_id();
                expected.push((id.clone(), entry.method.clone()));
                calls.push(JsonRpcRequest::new(entry.method.clone(), entry.params.clone(), id).into());
            }
        }

        (calls, expected)
    }
}

/// One slot of a batch result
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Id the entry was sent with
    pub id: Id,
    /// Method of the entry
    pub method: String,
    /// Result or error for this entry alone
    pub result: Result<Value>,
}

/// Results of a batch, one per reply-expecting entry, in submission order
#[derive(Debug, Clone)]
pub struct BatchResponse {
    items: Vec<BatchItem>,
}

impl BatchResponse {
    /// Match replies to the expected ids
    ///
    /// An expected id with no reply yields an `InvalidResponse` slot.
    pub fn from_replies(expected: Vec<(Id, String)>, replies: Vec<JsonRpcResponse>) -> Self {
        let mut by_id: HashMap<String, JsonRpcResponse> =
            replies.into_iter().map(|r| (id_to_key(&r.id), r)).collect();

        let items = expected
            .into_iter()
            .map(|(id, method)| {
                let result = match by_id.remove(&id_to_key(&id)) {
                    Some(reply) => reply.into_result(),
                    None => Err(Error::InvalidResponse(format!("no reply for id {}", id))),
                };
                BatchItem { id, method, result }
            })
            .collect();

        Self { items }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no slots (the batch held only notifications)
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All slots in submission order
    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    /// Typed result of one slot
    pub fn get<R: DeserializeOwned>(&self, index: usize) -> Result<R> {
        let item = self
            .items
            .get(index)
            .ok_or_else(|| Error::InvalidRequest(format!("no batch slot {}", index)))?;
        let value = item.result.clone()?;
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Per-slot results in submission order
    pub fn into_results(self) -> Vec<Result<Value>> {
        self.items.into_iter().map(|item| item.result).collect()
    }

    /// All values, or the first error in submission order
    pub fn into_values(self) -> Result<Vec<Value>> {
        self.into_results().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livewire_core::JsonRpcErrorData;
    use serde_json::json;

    #[test]
    fn test_slots_skip_notifications() {
        let mut batch = BatchRequest::new();
        assert_eq!(batch.add_request("a", json!({"x": 1})), 0);
        batch.add_notification("b", ());
        assert_eq!(batch.add_request("c", ()), 1);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.request_count(), 2);
    }

    #[test]
    fn test_prepare_assigns_ids_to_requests_only() {
        let mut batch = BatchRequest::new();
        batch.add_request("a", ());
        batch.add_notification("b", json!({"k": "v"}));
        batch.add_request("c", json!([1, 2]));

        let ids = RequestManager::new();
        let (calls, expected) = batch.prepare(&ids);

        assert_eq!(calls.len(), 3);
        assert!(calls[1].is_notification());
        assert_eq!(expected, vec![(Id::Number(1), "a".to_string()), (Id::Number(2), "c".to_string())]);

        let text = serde_json::to_string(&calls).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value[0].get("params").is_none());
        assert_eq!(value[2]["params"], json!([1, 2]));
    }

    #[test]
    fn test_replies_reordered_by_id() {
        let expected = vec![(Id::Number(1), "a".into()), (Id::Number(3), "c".into())];
        let replies = vec![
            JsonRpcResponse::success(json!("third"), Id::Number(3)),
            JsonRpcResponse::success(json!("first"), Id::Number(1)),
        ];

        let response = BatchResponse::from_replies(expected, replies);
        let values = response.into_values().unwrap();
        assert_eq!(values, vec![json!("first"), json!("third")]);
    }

    #[test]
    fn test_partial_failure_keeps_other_slots() {
        let expected = vec![
            (Id::Number(1), "a".into()),
            (Id::Number(2), "b".into()),
            (Id::Number(3), "c".into()),
        ];
        let replies = vec![
            JsonRpcResponse::success(json!(1), Id::Number(1)),
            JsonRpcResponse::error(JsonRpcErrorData::method_not_found("b"), Id::Number(2)),
        ];

        let response = BatchResponse::from_replies(expected, replies);
        assert_eq!(response.get::<i64>(0).unwrap(), 1);
        assert_eq!(response.get::<Value>(1).unwrap_err().rpc_code(), Some(-32601));
        assert!(matches!(response.get::<Value>(2), Err(Error::InvalidResponse(_))));
        assert!(matches!(response.get::<Value>(3), Err(Error::InvalidRequest(_))));

        assert!(response.into_values().is_err());
    }
}
