//! Where the pull strategy gets its data
//!
//! The coordinator only needs to make one named call. [`RemoteCall`] is
//! that seam: [`RpcClient`] implements it for production, tests plug in a
//! scripted source.

use async_trait::async_trait;
use livewire_client::{CallOptions, RpcClient};
use livewire_core::Result;
use serde_json::Value;
use std::sync::Arc;

/// A remote procedure call returning raw JSON
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Call `method`; `None` params are omitted from the request
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value>;
}

#[async_trait]
impl RemoteCall for RpcClient {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        RpcClient::call(self, method, params, CallOptions::default()).await
    }
}

#[async_trait]
impl<T: RemoteCall + ?Sized> RemoteCall for Arc<T> {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        (**self).call(method, params).await
    }
}
