//! Live feed demo
//!
//! Follows a telemetry server's node status, pulling over JSON-RPC and
//! switching to the push stream if pulls keep failing.
//!
//! Run with: cargo run --example live_feed -- http://127.0.0.1:25774

use livewire::{ClientBuilder, FeedConfig, FeedCoordinator, ObservabilityConfig, SharedClient};
use livewire_client::DEFAULT_RPC_PATH;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:25774".to_string());
    let base = base.trim_end_matches('/');

    let client = ClientBuilder::new(format!("{}{}", base, DEFAULT_RPC_PATH))
        .with_observability(ObservabilityConfig::new("livewire-demo").with_log_level("info"))
        .request_timeout(Duration::from_secs(5))
        .build()?;
    let shared = SharedClient::new(client);

    let version: serde_json::Value = shared
        .attach()
        .await
        .call("common:getVersion", (), Default::default())
        .await
        .unwrap_or(serde_json::Value::Null);
    tracing::info!(%version, "Server version");

    let feed = FeedCoordinator::new(Arc::new(shared.client().clone()), FeedConfig::for_server(base))?;
    feed.on_status(|status| {
        tracing::info!(connected = status.connected, mode = ?status.mode, "Feed status");
    });
    feed.subscribe(|batch| {
        for (id, node) in &batch.data.data {
            println!(
                "{:<12} online={:<5} cpu={:>5.1}% ram={:>12} up={:>10}/s down={:>10}/s",
                id,
                batch.is_online(id),
                node.cpu.usage,
                node.ram.used,
                node.network.up,
                node.network.down,
            );
        }
    });

    feed.start();
    tokio::signal::ctrl_c().await?;

    feed.stop().await;
    shared.detach().await;
    livewire::core::shutdown_observability();
    Ok(())
}
