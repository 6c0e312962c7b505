//! Common test utilities for livewire-feed integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use livewire_core::{Error, Result};
use livewire_feed::{FeedCoordinator, FeedStatus, RemoteCall, SnapshotBatch};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Pull source answering from a script
///
/// Scripted replies are used first; after that every call gets the
/// fallback reply, or fails if there is none.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<Value>>>,
    fallback: Option<Value>,
    latency: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    /// Every call fails
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call returns `reply`
    pub fn succeeding(reply: Value) -> Self {
        Self {
            fallback: Some(reply),
            ..Self::failing()
        }
    }

    /// Replies to use before the fallback
    pub fn with_script(self, script: Vec<Result<Value>>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    /// Time each call takes
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// When each call started
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteCall for ScriptedSource {
    async fn call(&self, _method: &str, _params: Option<Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => self.fallback.clone().ok_or(Error::ConnectionClosed),
        }
    }
}

/// Mock push endpoint
///
/// Sends `frames` to every new connection and records what clients send.
pub struct MockPushServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    kick_tx: broadcast::Sender<()>,
    received: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
}

impl MockPushServer {
    /// Server that sends `frames` on connect and keeps the stream open
    pub async fn new(frames: Vec<String>) -> Self {
        Self::start(frames, false).await
    }

    /// Server that closes every stream right after accepting it
    pub async fn closing() -> Self {
        Self::start(Vec::new(), true).await
    }

    async fn start(frames: Vec<String>, close_at_once: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (kick_tx, _) = broadcast::channel::<()>(8);
        let received = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicUsize::new(0));

        let server = Server {
            frames: Arc::new(frames),
            close_at_once,
            received: Arc::clone(&received),
            open: Arc::clone(&open),
        };
        let kick = kick_tx.clone();
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    accept_result = listener.accept() => {
                        let Ok((stream, _)) = accept_result else { continue };
                        accepted.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(server.clone().serve(stream, kick.subscribe()));
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            kick_tx,
            received,
            connections,
            open,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/api/clients", self.addr)
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Connections currently open
    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Text frames received from clients
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Close every open connection
    pub fn kick(&self) {
        let _ = self.kick_tx.send(());
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.kick_tx.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[derive(Clone)]
struct Server {
    frames: Arc<Vec<String>>,
    close_at_once: bool,
    received: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicUsize>,
}

impl Server {
    async fn serve(self, stream: tokio::net::TcpStream, mut kick: broadcast::Receiver<()>) {
        let Ok(ws) = accept_async(stream).await else { return };
        let (mut write, mut read) = ws.split();

        if self.close_at_once {
            let _ = write.send(Message::Close(None)).await;
            return;
        }

        self.open.fetch_add(1, Ordering::SeqCst);
        for frame in self.frames.iter() {
            if write.send(Message::Text(frame.clone())).await.is_err() {
                break;
            }
        }

        loop {
            tokio::select! {
                _ = kick.recv() => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.received.lock().unwrap().push(text),
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                },
            }
        }
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Record every batch and status the coordinator emits
pub fn record(feed: &FeedCoordinator) -> (Arc<Mutex<Vec<SnapshotBatch>>>, Arc<Mutex<Vec<FeedStatus>>>) {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let statuses = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&batches);
    feed.subscribe(move |batch| sink.lock().unwrap().push(batch.clone()));
    let sink = Arc::clone(&statuses);
    feed.on_status(move |status| sink.lock().unwrap().push(*status));

    (batches, statuses)
}

/// Poll `condition` every 20 ms for up to 5 s
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

/// Flat latest-status result for one node
pub fn pull_result(node: &str, cpu: f64) -> Value {
    json!({
        node: {
            "client": node,
            "online": true,
            "cpu": cpu,
            "ram": 512,
            "swap": 0,
            "load": 1.5, "load5": 1.0, "load15": 0.5,
            "disk": 4096,
            "net_out": 100, "net_in": 200,
            "net_total_up": 10000, "net_total_down": 20000,
            "connections": 12, "connections_udp": 4,
            "uptime": 86400,
            "process": 230,
            "time": "2024-06-01T12:00:00.000Z"
        }
    })
}

/// Push frame carrying the same data as [`pull_result`]
pub fn push_frame(node: &str, cpu: f64) -> String {
    json!({
        "data": {
            "online": [node],
            "data": {
                node: {
                    "cpu": {"usage": cpu},
                    "ram": {"used": 512},
                    "swap": {"used": 0},
                    "load": {"load1": 1.5, "load5": 1.0, "load15": 0.5},
                    "disk": {"used": 4096},
                    "network": {"up": 100, "down": 200, "totalUp": 10000, "totalDown": 20000},
                    "connections": {"tcp": 12, "udp": 4},
                    "uptime": 86400,
                    "process": 230,
                    "message": "",
                    "updated_at": "2024-06-01T12:00:00.000Z"
                }
            }
        },
        "status": "ok"
    })
    .to_string()
}
