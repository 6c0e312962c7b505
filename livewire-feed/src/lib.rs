//! Live telemetry feed with pull/push failover
//!
//! [`FeedCoordinator`] delivers [`SnapshotBatch`]es to subscribers, polling
//! the status method through any [`RemoteCall`] (normally a
//! `livewire_client::RpcClient`) and switching to a dedicated push stream
//! once polling keeps failing.

mod config;
mod coordinator;
mod snapshot;
mod source;
mod subscribers;

pub use config::{FeedConfig, DEFAULT_PUSH_PATH, DEFAULT_STATUS_METHOD};
pub use coordinator::{FeedCoordinator, FeedMode, FeedStatus, KEEPALIVE_FRAME};
pub use snapshot::{
    Connections, CpuUsage, GpuUsage, LiveData, LoadAverage, NetworkStats, NodeSnapshot, SnapshotBatch, Usage,
    STATUS_OK,
};
pub use source::RemoteCall;
pub use subscribers::{Subscribers, SubscriptionId};
