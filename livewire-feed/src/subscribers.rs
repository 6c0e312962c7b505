//! Callback registries for feed consumers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Callbacks interested in one kind of value
///
/// Callbacks run on the feed task, outside the registry lock.
pub struct Subscribers<E> {
    callbacks: Mutex<Vec<(SubscriptionId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E> Subscribers<E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Callback<E>)>> {
        self.callbacks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a callback
    pub fn add<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback; `false` if the id is unknown
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Call every callback with `value`
    pub fn emit(&self, value: &E) {
        let callbacks: Vec<Callback<E>> = self.lock().iter().map(|(_, c)| Arc::clone(c)).collect();
        for callback in callbacks {
            callback(value);
        }
    }

    /// Number of callbacks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if there are no callbacks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
