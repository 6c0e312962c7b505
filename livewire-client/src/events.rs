//! Lifecycle and message events of the call client
//!
//! Listeners are plain synchronous callbacks. They run on the task that
//! produced the event, after the registry lock has been released, so a
//! listener may register or remove listeners itself. Keep them short;
//! anything slow belongs on a spawned task.
//!
//! ```rust,no_run
//! use livewire_client::{ClientEvent, RpcClient};
//!
//! # fn example(client: &RpcClient) {
//! let id = client.on_event(|event| match event {
//!     ClientEvent::Reconnecting(attempt) => println!("retry #{}", attempt),
//!     ClientEvent::Error(message) => eprintln!("socket error: {}", message),
//!     _ => {}
//! });
//!
//! client.remove_listener(id);
//! # }
//! ```

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Something that happened to the socket
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The socket opened
    Connect,
    /// The socket closed, by request or not
    Disconnect,
    /// Opening the socket failed
    Error(String),
    /// A retry was scheduled; carries the attempt number, starting at 1
    Reconnecting(u32),
    /// Any inbound frame that parsed as JSON
    Message(Value),
}

/// Handle returned by registration, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Registry of event listeners
#[derive(Clone, Default)]
pub struct ClientEvents {
    listeners: Arc<Mutex<Vec<(ListenerId, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

impl ClientEvents {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        // A listener that panicked must not take the registry down with it.
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a listener
    pub fn register<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns `false` if it was not registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener
    pub fn emit(&self, event: ClientEvent) {
        let listeners: Vec<Listener> = self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(&event);
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no listener is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
