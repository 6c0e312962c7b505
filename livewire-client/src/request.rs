//! Correlation table for in-flight socket calls
//!
//! Every call that expects a reply over the socket gets an entry here,
//! keyed by its id, holding the oneshot sender its caller awaits. An entry
//! leaves the table exactly once:
//!
//! - a reply with its id arrives ([`RequestManager::complete`]),
//! - its timeout fires ([`RequestManager::cancel`]), or
//! - the socket goes away ([`RequestManager::fail_all`]).
//!
//! A reply for an id that is no longer in the table (late, or never sent)
//! is dropped.
//!
//! Ids come from one counter starting at 1 and are never reused. HTTP and
//! batch calls draw from the same counter.

use livewire_core::{Error, Id, JsonRpcResponse, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

type Reply = Result<JsonRpcResponse>;

/// Tracks pending calls and hands out ids
#[derive(Clone)]
pub struct RequestManager {
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<Reply>>>>,
    counter: Arc<AtomicU64>,
}

impl RequestManager {
    /// Create an empty table; the first id is 1
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Next unused id
    pub fn next_id(&self) -> Id {
        Id::from(self.counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Add an entry and return the receiver the caller awaits
    pub async fn register(&self, id: &Id) -> oneshot::Receiver<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id_to_key(id), tx);
        rx
    }

    /// Deliver a reply to the call with the same id
    ///
    /// Returns `false` when no call is waiting for that id.
    pub async fn complete(&self, response: JsonRpcResponse) -> bool {
        let entry = self.pending.lock().await.remove(&id_to_key(&response.id));
        match entry {
            Some(tx) => {
                let _ = tx.send(Ok(response));
                true
            }
            None => {
                tracing::debug!(id = %response.id, "Dropping reply with no pending call");
                false
            }
        }
    }

    /// Remove an entry without answering it
    ///
    /// Used when the caller has given up (timeout, failed send).
    pub async fn cancel(&self, id: &Id) -> bool {
        self.pending.lock().await.remove(&id_to_key(id)).is_some()
    }

    /// Reject every pending call with the same error
    pub async fn fail_all(&self, error: Error) -> usize {
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
        count
    }

    /// Number of calls still waiting
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric ids echoed back as strings still match
pub(crate) fn id_to_key(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
        Id::Null => "null".to_string(),
    }
}
