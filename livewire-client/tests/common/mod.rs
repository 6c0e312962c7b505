//! Common test utilities for livewire-client integration tests
//!
//! Scripted socket and HTTP servers standing in for the telemetry backend.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use warp::http::StatusCode;
use warp::Filter;

/// A frame the mock socket server sends back, after an optional delay
pub type Scripted = (Duration, String);

type WsHandler = Arc<dyn Fn(&str) -> Vec<Scripted> + Send + Sync>;

/// Mock WebSocket server
///
/// Every text frame received is recorded and passed to the handler; the
/// frames it returns are written back on the same connection.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    kick_tx: broadcast::Sender<()>,
    message_rx: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Server that never replies
    pub async fn silent() -> Self {
        Self::with_handler(|_| Vec::new()).await
    }

    /// Server that answers every request with `result`
    pub async fn replying(result: Value) -> Self {
        Self::with_handler(move |text| match request_id(text) {
            Some(id) => vec![now(mock_response(id, result.clone()))],
            None => Vec::new(),
        })
        .await
    }

    /// Start a server with a custom handler
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Vec<Scripted> + Send + Sync + 'static,
    {
        let handler: WsHandler = Arc::new(handler);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (kick_tx, _) = broadcast::channel::<()>(8);
        let (msg_tx, message_rx) = mpsc::unbounded_channel();
        let connections = Arc::new(AtomicUsize::new(0));

        let kick = kick_tx.clone();
        let accepted = Arc::clone(&connections);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    accept_result = listener.accept() => {
                        let Ok((stream, _)) = accept_result else { continue };
                        accepted.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(serve_connection(
                            stream,
                            Arc::clone(&handler),
                            msg_tx.clone(),
                            kick.subscribe(),
                        ));
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            kick_tx,
            message_rx,
            connections,
        }
    }

    /// Socket URL of this server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Connections accepted so far
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Close every open connection; the listener keeps accepting
    pub fn kick(&self) {
        let _ = self.kick_tx.send(());
    }

    /// Wait for the next text frame a client sent
    pub async fn next_message(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
            .and_then(|text| serde_json::from_str(&text).ok())
    }

    /// Stop accepting and close every open connection
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.kick_tx.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    handler: WsHandler,
    recorded: mpsc::UnboundedSender<String>,
    mut kick: broadcast::Receiver<()>,
) {
    let Ok(ws) = accept_async(stream).await else { return };
    let (mut write, mut read) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    loop {
        tokio::select! {
            _ = kick.recv() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            Some(text) = out_rx.recv() => {
                if write.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = recorded.send(text.clone());
                    for (delay, reply) in handler(&text) {
                        let out = out_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = out.send(reply);
                        });
                    }
                }
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}

type HttpHandler = Arc<dyn Fn(&Value) -> (u16, Option<Value>) + Send + Sync>;

/// Mock HTTP endpoint
///
/// Records every POSTed body and answers with the handler's status and
/// optional JSON body.
pub struct MockHttpServer {
    addr: SocketAddr,
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl MockHttpServer {
    /// Endpoint that answers every request with `result`
    pub fn replying(result: Value) -> Self {
        Self::with_handler(move |body| {
            let id = body.get("id").cloned().unwrap_or(Value::Null);
            (200, Some(json!({"jsonrpc": "2.0", "result": result.clone(), "id": id})))
        })
    }

    /// Start an endpoint with a custom handler
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> (u16, Option<Value>) + Send + Sync + 'static,
    {
        let handler: HttpHandler = Arc::new(handler);
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&bodies);
        let route = warp::post().and(warp::body::bytes()).map(move |raw: warp::hyper::body::Bytes| {
            let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);
            recorded.lock().unwrap().push(body.clone());
            let (status, reply) = handler(&body);
            let text = reply.map(|v| v.to_string()).unwrap_or_default();
            warp::reply::with_status(text, StatusCode::from_u16(status).unwrap())
        });

        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        Self { addr, bodies }
    }

    /// HTTP URL of the RPC endpoint
    pub fn url(&self) -> String {
        format!("http://{}/api/rpc2", self.addr)
    }

    /// Requests received so far
    pub fn hits(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }

    /// Bodies received so far
    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

/// Reply sent without delay
pub fn now(text: String) -> Scripted {
    (Duration::ZERO, text)
}

/// Reply sent after `ms` milliseconds
pub fn after(ms: u64, text: String) -> Scripted {
    (Duration::from_millis(ms), text)
}

/// Id of a request frame, `None` for notifications
pub fn request_id(text: &str) -> Option<Value> {
    let value: Value = serde_json::from_str(text).ok()?;
    value.get("id").cloned()
}

/// Method of a request or notification frame
pub fn request_method(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    value.get("method")?.as_str().map(str::to_string)
}

/// JSON-RPC success reply
pub fn mock_response(id: Value, result: Value) -> String {
    json!({"jsonrpc": "2.0", "result": result, "id": id}).to_string()
}

/// JSON-RPC error reply
pub fn mock_error_response(id: Value, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "error": {"code": code, "message": message},
        "id": id
    })
    .to_string()
}

/// An address nothing listens on
pub fn dead_url() -> String {
    "http://127.0.0.1:1/api/rpc2".to_string()
}
