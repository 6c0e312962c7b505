//! Pull/push feed coordinator
//!
//! A [`FeedCoordinator`] keeps consumers supplied with [`SnapshotBatch`]es
//! from one of two strategies:
//!
//! - **Pull** (the starting mode): call the status method, wait
//!   `pull_interval` after the call completes, repeat. The wait is measured
//!   from completion, so slow calls never overlap.
//! - **Push**: a dedicated socket to `push_url` that streams batches as
//!   they happen, with a `"get"` keep-alive while it is open.
//!
//! After `failure_threshold` consecutive pull failures the feed switches to
//! push for the rest of the run. The switch is one-way; only a new
//! [`start`](FeedCoordinator::start) goes back to pull. The push socket
//! reconnects forever, `push_reconnect_delay` apart, unlike the call
//! client's bounded retries.
//!
//! Every attempt reports a [`FeedStatus`]; every batch goes to the data
//! subscribers.
//!
//! ```rust,no_run
//! use livewire_client::ClientBuilder;
//! use livewire_feed::{FeedConfig, FeedCoordinator};
//! use std::sync::Arc;
//!
//! # async fn example() -> livewire_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:25774/api/rpc2").build()?;
//! let feed = FeedCoordinator::new(Arc::new(client), FeedConfig::for_server("http://localhost:25774"))?;
//!
//! feed.subscribe(|batch| println!("{} nodes online", batch.data.online.len()));
//! feed.on_status(|status| println!("live={} mode={:?}", status.connected, status.mode));
//! feed.start();
//! # feed.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::config::FeedConfig;
use crate::snapshot::SnapshotBatch;
use crate::source::RemoteCall;
use crate::subscribers::{SubscriptionId, Subscribers};
use futures::{SinkExt, StreamExt};
use livewire_client::{FixedDelay, ReconnectionStrategy};
use livewire_core::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type PushStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Keep-alive frame sent on the push stream
pub const KEEPALIVE_FRAME: &str = "get";

const STOP_GRACE: Duration = Duration::from_secs(1);

/// Active strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Periodic status calls
    Pull,
    /// Streamed batches
    Push,
}

/// Outcome of the latest attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedStatus {
    /// Whether the attempt got through
    pub connected: bool,
    /// Strategy the attempt used
    pub mode: FeedMode,
}

struct FeedState {
    mode: FeedMode,
    failures: u32,
    live: bool,
    latest: Option<SnapshotBatch>,
}

struct Shared {
    source: Arc<dyn RemoteCall>,
    config: FeedConfig,
    data: Subscribers<SnapshotBatch>,
    status: Subscribers<FeedStatus>,
    state: Mutex<FeedState>,
}

struct Run {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Switches a live feed between pull and push
pub struct FeedCoordinator {
    shared: Arc<Shared>,
    run: Mutex<Option<Run>>,
}

enum SessionEnd {
    Stopped,
    Closed,
}

impl FeedCoordinator {
    /// Create a stopped coordinator
    pub fn new(source: Arc<dyn RemoteCall>, config: FeedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                source,
                config,
                data: Subscribers::new(),
                status: Subscribers::new(),
                state: Mutex::new(FeedState {
                    mode: FeedMode::Pull,
                    failures: 0,
                    live: false,
                    latest: None,
                }),
            }),
            run: Mutex::new(None),
        })
    }

    /// Start in pull mode, fetching once right away
    ///
    /// Restarts from scratch if already running. Must be called inside a
    /// tokio runtime.
    pub fn start(&self) {
        let mut run = self.run();
        if let Some(previous) = run.take() {
            tracing::debug!("Restarting feed");
            let _ = previous.shutdown.send(true);
            previous.task.abort();
        }
        {
            let mut state = self.shared.state();
            state.mode = FeedMode::Pull;
            state.failures = 0;
        }

        let (shutdown, stopped) = watch::channel(false);
        let task = tokio::spawn(run_feed(Arc::clone(&self.shared), stopped));
        *run = Some(Run { shutdown, task });
        tracing::info!(url = %self.shared.config.push_url, "Feed started");
    }

    /// Stop fetching and close the push stream
    ///
    /// Safe to call when not running.
    pub async fn stop(&self) {
        let run = self.run().take();
        let Some(run) = run else { return };

        let _ = run.shutdown.send(true);
        let mut task = run.task;
        if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
            task.abort();
        }
        tracing::info!("Feed stopped");
    }

    /// Check whether the feed task is running
    pub fn is_running(&self) -> bool {
        self.run().as_ref().map(|run| !run.task.is_finished()).unwrap_or(false)
    }

    /// Register a data callback
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&SnapshotBatch) + Send + Sync + 'static,
    {
        self.shared.data.add(callback)
    }

    /// Remove a data callback
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.data.remove(id)
    }

    /// Register a status callback
    pub fn on_status<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FeedStatus) + Send + Sync + 'static,
    {
        self.shared.status.add(callback)
    }

    /// Remove a status callback
    pub fn remove_status(&self, id: SubscriptionId) -> bool {
        self.shared.status.remove(id)
    }

    /// Current strategy
    pub fn mode(&self) -> FeedMode {
        self.shared.state().mode
    }

    /// Whether the latest attempt got through
    pub fn is_live(&self) -> bool {
        self.shared.state().live
    }

    /// Most recent batch, from either strategy
    pub fn latest(&self) -> Option<SnapshotBatch> {
        self.shared.state().latest.clone()
    }

    /// Consecutive pull failures so far
    pub fn pull_failures(&self) -> u32 {
        self.shared.state().failures
    }

    fn run(&self) -> MutexGuard<'_, Option<Run>> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for FeedCoordinator {
    fn drop(&mut self) {
        let run = match self.run.get_mut() {
            Ok(run) => run.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(run) = run {
            run.task.abort();
        }
    }
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn report(&self, connected: bool, mode: FeedMode) {
        self.state().live = connected;
        self.status.emit(&FeedStatus { connected, mode });
    }

    fn deliver(&self, batch: SnapshotBatch) {
        self.state().latest = Some(batch.clone());
        self.data.emit(&batch);
    }

    async fn fetch(&self) -> Result<SnapshotBatch> {
        let result = self.source.call(&self.config.status_method, None).await?;
        SnapshotBatch::from_pull(&result)
    }

    /// Pull until stopped or promoted; returns `true` on promotion
    async fn pull(&self, stopped: &mut watch::Receiver<bool>) -> bool {
        loop {
            let fetched = tokio::select! {
                fetched = self.fetch() => fetched,
                _ = cancelled(stopped) => return false,
            };

            match fetched {
                Ok(batch) => {
                    self.state().failures = 0;
                    self.report(true, FeedMode::Pull);
                    self.deliver(batch);
                }
                Err(e) => {
                    let failures = {
                        let mut state = self.state();
                        state.failures += 1;
                        state.failures
                    };
                    tracing::warn!(error = %e, failures, "Status pull failed");
                    self.report(false, FeedMode::Pull);
                    if failures >= self.config.failure_threshold {
                        self.state().mode = FeedMode::Push;
                        tracing::warn!(threshold = self.config.failure_threshold, "Switching feed to push");
                        return true;
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.pull_interval) => {}
                _ = cancelled(stopped) => return false,
            }
        }
    }

    async fn push(&self, stopped: &mut watch::Receiver<bool>) {
        let mut policy = FixedDelay::new(self.config.push_reconnect_delay);
        let mut attempt = 0u32;

        loop {
            tracing::info!(url = %self.config.push_url, attempt, "Opening push stream");
            let opened = tokio::select! {
                opened = connect_async(self.config.push_url.as_str()) => opened,
                _ = cancelled(stopped) => return,
            };

            match opened {
                Ok((stream, _)) => {
                    attempt = 0;
                    policy.reset();
                    self.report(true, FeedMode::Push);
                    if let SessionEnd::Stopped = self.session(stream, stopped).await {
                        return;
                    }
                    tracing::warn!("Push stream closed");
                }
                Err(e) => tracing::warn!(error = %e, "Push stream open failed"),
            }
            self.report(false, FeedMode::Push);

            let Some(delay) = policy.next_delay(attempt) else {
                tracing::error!("Push reconnection abandoned");
                return;
            };
            attempt = attempt.saturating_add(1);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancelled(stopped) => return,
            }
        }
    }

    async fn session(&self, stream: PushStream, stopped: &mut watch::Receiver<bool>) -> SessionEnd {
        let (mut write, mut read) = stream.split();
        let mut keepalive = tokio::time::interval(self.config.keepalive_interval);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);
        keepalive.tick().await;

        loop {
            tokio::select! {
                _ = cancelled(stopped) => {
                    let _ = tokio::time::timeout(STOP_GRACE, write.close()).await;
                    return SessionEnd::Stopped;
                }
                _ = keepalive.tick() => {
                    if let Err(e) = write.send(Message::Text(KEEPALIVE_FRAME.to_string())).await {
                        tracing::warn!(error = %e, "Push keep-alive failed");
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => match SnapshotBatch::from_push(&text) {
                        Ok(batch) => self.deliver(batch),
                        Err(e) => tracing::warn!(error = %e, "Dropping malformed push frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Push stream read failed");
                        return SessionEnd::Closed;
                    }
                },
            }
        }
    }
}

async fn run_feed(shared: Arc<Shared>, mut stopped: watch::Receiver<bool>) {
    if shared.pull(&mut stopped).await {
        shared.push(&mut stopped).await;
    }
}

/// Resolves once `stop()` was requested or the coordinator is gone
async fn cancelled(stopped: &mut watch::Receiver<bool>) {
    while !*stopped.borrow() {
        if stopped.changed().await.is_err() {
            return;
        }
    }
}
