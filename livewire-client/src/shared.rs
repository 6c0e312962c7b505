//! Reference-counted access to one call client
//!
//! Several consumers (views, feeds) may share a single [`RpcClient`]. The
//! socket opens when the first consumer attaches and closes when the last
//! one detaches.

use crate::client::RpcClient;
use tokio::sync::Mutex;

/// A call client shared by counted consumers
pub struct SharedClient {
    client: RpcClient,
    refs: Mutex<usize>,
}

impl SharedClient {
    /// Wrap a client; nothing is attached yet
    pub fn new(client: RpcClient) -> Self {
        Self {
            client,
            refs: Mutex::new(0),
        }
    }

    /// The wrapped client, without taking a reference
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Take a reference, connecting on the first one
    ///
    /// A failed connect is logged; socket calls made with the returned
    /// client still fall back to HTTP or retry the connect.
    pub async fn attach(&self) -> RpcClient {
        let mut refs = self.refs.lock().await;
        *refs += 1;
        if *refs == 1 && !self.client.is_connected().await {
            if let Err(e) = self.client.connect().await {
                tracing::warn!(error = %e, "Shared client connect failed");
            }
        }
        self.client.clone()
    }

    /// Drop a reference, disconnecting after the last one
    pub async fn detach(&self) {
        let mut refs = self.refs.lock().await;
        if *refs == 0 {
            return;
        }
        *refs -= 1;
        if *refs == 0 {
            tracing::debug!("Last consumer detached, disconnecting");
            self.client.disconnect().await;
        }
    }

    /// Current number of references
    pub async fn ref_count(&self) -> usize {
        *self.refs.lock().await
    }
}
