//! Livewire - live telemetry over JSON-RPC 2.0
//!
//! This is the convenience crate that re-exports all Livewire sub-crates.
//! Use it if you want a single dependency for both the call client and the
//! feed coordinator.
//!
//! # Architecture
//!
//! - **livewire-core**: wire types, codec, error handling, observability
//! - **livewire-client**: socket-first JSON-RPC client with HTTP fallback
//! - **livewire-feed**: snapshot feed switching between pull and push
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use livewire::{ClientBuilder, FeedConfig, FeedCoordinator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("http://localhost:25774/api/rpc2").build()?;
//!     let feed = FeedCoordinator::new(
//!         Arc::new(client),
//!         FeedConfig::for_server("http://localhost:25774"),
//!     )?;
//!
//!     feed.subscribe(|batch| {
//!         for id in &batch.data.online {
//!             println!("{} is online", id);
//!         }
//!     });
//!     feed.start();
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     feed.stop().await;
//!     Ok(())
//! }
//! ```

// Re-export the sub-crates under short names
pub use livewire_client as client;
pub use livewire_core as core;
pub use livewire_feed as feed;

// Most commonly used types
pub use livewire_client::{CallOptions, ClientBuilder, RpcClient, SharedClient};
pub use livewire_core::{Error, ObservabilityConfig, Result};
pub use livewire_feed::{FeedConfig, FeedCoordinator, FeedMode, FeedStatus, SnapshotBatch};
