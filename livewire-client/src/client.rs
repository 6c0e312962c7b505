//! Dual-transport JSON-RPC client
//!
//! [`RpcClient`] prefers one persistent WebSocket for all calls and falls
//! back to one-shot HTTP POSTs when the socket cannot carry a call. Three
//! independent failure sources meet here and come out as one `Result` per
//! call:
//!
//! - the socket lifecycle (open, unexpected close, bounded reconnect),
//! - the HTTP exchange (unreachable, non-2xx),
//! - the per-call reply deadline.
//!
//! # Call Paths
//!
//! - [`RpcClient::call`]: socket first; on any failure, one HTTP retry if
//!   `enable_http_fallback` is set. Never both at once.
//! - [`RpcClient::call_via_socket`] / [`RpcClient::call_via_http`]: one
//!   transport, no fallback.
//! - [`RpcClient::batch_call`]: HTTP only, one POST for the whole batch.
//!
//! # Socket Lifecycle
//!
//! Replies are matched to calls by id alone, so calls may complete in any
//! order. An unexpected close rejects every in-flight socket call with
//! `Error::ConnectionClosed` and, with `auto_reconnect`, schedules up to
//! `max_reconnect_attempts` retries `reconnect_interval` apart. While
//! connected, an `rpc.ping` notification goes out every
//! `heartbeat_interval`.
//!
//! ```rust,no_run
//! use livewire_client::{CallOptions, ClientBuilder};
//! use serde_json::{json, Value};
//! use std::time::Duration;
//!
//! # async fn example() -> livewire_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:8080/api/rpc2").build()?;
//! client.connect().await?;
//!
//! let nodes: Value = client.call("common:getNodes", (), CallOptions::default()).await?;
//! let recent: Value = client
//!     .call(
//!         "common:getRecords",
//!         json!({"uuid": "n1", "hours": 1}),
//!         CallOptions::with_timeout(Duration::from_secs(5)),
//!     )
//!     .await?;
//!
//! client.disconnect().await;
//! # let _ = (nodes, recent);
//! # Ok(())
//! # }
//! ```

use crate::batch::{BatchRequest, BatchResponse};
use crate::client_builder::{ClientBuilder, ClientConfig};
use crate::connection_state::{ConnectionManager, ConnectionState};
use crate::events::{ClientEvent, ClientEvents, ListenerId};
use crate::http::HttpTransport;
use crate::metrics::{ClientMetrics, Transport};
use crate::reconnect::{FixedDelay, NoReconnect, ReconnectionStrategy};
use crate::request::{id_to_key, RequestManager};
use futures::future::BoxFuture;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use livewire_core::{
    codec, Error, JsonRpcErrorData, JsonRpcNotification, JsonRpcRequest, Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, Weak};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Method of the heartbeat notification
pub const HEARTBEAT_METHOD: &str = "rpc.ping";

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Per-call options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Overrides `ClientConfig::request_timeout` for this call
    pub timeout: Option<Duration>,
    /// Send as a notification: no id, no reply, resolves to `null` once sent
    pub notification: bool,
}

impl CallOptions {
    /// Options with a specific reply deadline
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            notification: false,
        }
    }

    /// Options for a notification
    pub fn notification() -> Self {
        Self {
            timeout: None,
            notification: true,
        }
    }
}

#[derive(Default)]
struct Tasks {
    receive: Option<JoinHandle<()>>,
    heartbeat: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_all(self) {
        for handle in [self.receive, self.heartbeat, self.reconnect].into_iter().flatten() {
            handle.abort();
        }
    }
}

struct Inner {
    config: ClientConfig,
    socket_url: String,
    http: HttpTransport,
    sender: Mutex<Option<WsSink>>,
    connect_lock: Mutex<()>,
    requests: RequestManager,
    connection: ConnectionManager,
    events: ClientEvents,
    auto_reconnect: AtomicBool,
    /// Bumped on every open and on every disconnect(); a receive loop
    /// whose epoch is stale must not touch shared state when it ends.
    epoch: AtomicU64,
    tasks: StdMutex<Tasks>,
    metrics: Option<Arc<ClientMetrics>>,
}

/// JSON-RPC client over a WebSocket with HTTP fallback
///
/// Cheap to clone; clones share one socket, one correlation table and one
/// id counter. Background tasks hold only weak references, so dropping the
/// last clone tears everything down.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<Inner>,
}

impl RpcClient {
    /// Start building a client for the given HTTP endpoint
    pub fn builder(http_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(http_url)
    }

    pub(crate) fn new(
        config: ClientConfig,
        http_url: String,
        socket_url: String,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self> {
        let strategy: Box<dyn ReconnectionStrategy> = if config.auto_reconnect {
            Box::new(
                FixedDelay::new(config.reconnect_interval)
                    .with_max_attempts(config.max_reconnect_attempts),
            )
        } else {
            Box::new(NoReconnect)
        };
        let http = HttpTransport::new(http_url, &config.headers)?;

        Ok(Self {
            inner: Arc::new(Inner {
                socket_url,
                http,
                sender: Mutex::new(None),
                connect_lock: Mutex::new(()),
                requests: RequestManager::new(),
                connection: ConnectionManager::new(strategy),
                events: ClientEvents::new(),
                auto_reconnect: AtomicBool::new(config.auto_reconnect),
                epoch: AtomicU64::new(0),
                tasks: StdMutex::new(Tasks::default()),
                metrics,
                config,
            }),
        })
    }

    /// Effective configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// HTTP endpoint used for fallback and batch calls
    pub fn http_url(&self) -> &str {
        self.inner.http.url()
    }

    /// Socket endpoint
    pub fn socket_url(&self) -> &str {
        &self.inner.socket_url
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        self.inner.connection.state().await
    }

    /// True when the socket is open
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.is_connected().await
    }

    /// Number of socket calls waiting for a reply
    pub async fn pending_calls(&self) -> usize {
        self.inner.requests.pending_count().await
    }

    /// Open the socket
    ///
    /// Returns at once if already connected. If another open is in
    /// progress this waits for it instead of opening a second socket.
    /// Re-arms auto-reconnect after a previous [`disconnect`](Self::disconnect).
    #[tracing::instrument(skip(self), fields(url = %self.inner.socket_url))]
    pub async fn connect(&self) -> Result<()> {
        self.inner
            .auto_reconnect
            .store(self.inner.config.auto_reconnect, Ordering::SeqCst);
        Inner::establish(&self.inner).await
    }

    /// Open the socket for the builder's auto-connect
    ///
    /// Does nothing if [`disconnect`](Self::disconnect) ran since `epoch`
    /// was read, and never re-arms auto-reconnect.
    pub(crate) async fn connect_unless_disconnected(&self, epoch: u64) -> Result<()> {
        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("Skipping auto-connect after disconnect");
            return Ok(());
        }
        Inner::establish(&self.inner).await
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    /// Close the socket and stop all background activity
    ///
    /// Disables auto-reconnect, cancels a pending retry and the heartbeat,
    /// and rejects every in-flight socket call with
    /// `Error::ConnectionClosed`. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let inner = &self.inner;
        inner.auto_reconnect.store(false, Ordering::SeqCst);
        inner.epoch.fetch_add(1, Ordering::SeqCst);

        let tasks = std::mem::take(&mut *inner.tasks());
        tasks.abort_all();

        let sink = inner.sender.lock().await.take();
        if let Some(mut sink) = sink {
            let _ = tokio::time::timeout(CLOSE_GRACE, sink.close()).await;
        }

        let previous = inner.connection.disconnected().await;
        inner.record_state(ConnectionState::Disconnected);
        let rejected = inner.requests.fail_all(Error::ConnectionClosed).await;

        if previous != ConnectionState::Disconnected {
            tracing::info!(rejected, "Disconnected");
            inner.events.emit(ClientEvent::Disconnect);
        }
    }

    /// Call a method, preferring the socket and falling back to HTTP
    ///
    /// `params` that serialize to `null` (including `()`) are left out of
    /// the envelope. With `options.notification` the call resolves once
    /// sent and `R` must accept `null`.
    #[tracing::instrument(skip(self, params, options))]
    pub async fn call<P, R>(&self, method: &str, params: P, options: CallOptions) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        let value = match Inner::socket_call(&self.inner, method, params.clone(), options).await {
            Ok(value) => value,
            Err(error) if self.inner.config.enable_http_fallback => {
                tracing::warn!(error = %error, "Socket call failed, retrying over HTTP");
                if let Some(m) = &self.inner.metrics {
                    m.record_fallback(method);
                }
                self.inner.http_call(method, params, options).await?
            }
            Err(error) => return Err(error),
        };
        from_value(value)
    }

    /// Call a method over the socket only
    #[tracing::instrument(skip(self, params, options))]
    pub async fn call_via_socket<P, R>(&self, method: &str, params: P, options: CallOptions) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        from_value(Inner::socket_call(&self.inner, method, params, options).await?)
    }

    /// Call a method over HTTP only
    #[tracing::instrument(skip(self, params, options))]
    pub async fn call_via_http<P, R>(&self, method: &str, params: P, options: CallOptions) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = to_params(params)?;
        from_value(self.inner.http_call(method, params, options).await?)
    }

    /// Send a notification; nothing comes back
    pub async fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        self.call::<P, Value>(method, params, CallOptions::notification())
            .await
            .map(|_| ())
    }

    /// Send a batch as one HTTP POST
    ///
    /// The result has one slot per non-notification entry, in the order
    /// the entries were added. A server that rejects the batch as a whole
    /// (a single error object instead of an array) fails the entire call.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn batch_call(&self, batch: BatchRequest) -> Result<BatchResponse> {
        if batch.is_empty() {
            return Err(Error::InvalidRequest("Batch cannot be empty".into()));
        }

        let (calls, expected) = batch.prepare(&self.inner.requests);
        let body = codec::encode_batch(&calls)?;
        if let Some(m) = &self.inner.metrics {
            m.record_batch(calls.len() as u64);
        }

        let reply = tokio::time::timeout(self.inner.config.request_timeout, self.inner.http.post(body))
            .await
            .map_err(|_| Error::Timeout {
                method: "batch".to_string(),
            })??;

        let replies = match reply {
            Some(value) => {
                if let Some(error) = value.get("error") {
                    let data: JsonRpcErrorData = serde_json::from_value(error.clone())?;
                    return Err(Error::JsonRpc(data));
                }
                codec::responses_from_value(&value)
            }
            None => Vec::new(),
        };

        tracing::debug!(reply_count = replies.len(), "Batch completed");
        Ok(BatchResponse::from_replies(expected, replies))
    }

    /// Register an event listener
    pub fn on_event<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.inner.events.register(listener)
    }

    /// Remove an event listener
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.events.unregister(id)
    }
}

impl Inner {
    fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_state(&self, state: ConnectionState) {
        if let Some(m) = &self.metrics {
            m.update_connection_state(state.as_metric());
        }
    }

    fn record_call(&self, method: &str, transport: Transport, result: &Result<Value>, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        match result {
            Ok(_) => tracing::debug!(method, transport = transport.as_str(), duration_secs = elapsed, "Call completed"),
            Err(e) => tracing::debug!(method, transport = transport.as_str(), error = %e, "Call failed"),
        }
        if let Some(m) = &self.metrics {
            m.record_call(method, transport, result.as_ref().map(|_| ()), elapsed);
        }
    }

    // Boxed to break the establish -> receive -> reconnect -> establish cycle.
    fn establish(inner: &Arc<Inner>) -> BoxFuture<'_, Result<()>> {
        Box::pin(Inner::establish_impl(inner))
    }

    async fn establish_impl(inner: &Arc<Inner>) -> Result<()> {
        let _guard = inner.connect_lock.lock().await;
        if !inner.connection.begin_connecting().await {
            return Ok(());
        }
        inner.record_state(ConnectionState::Connecting);
        let epoch = inner.epoch.load(Ordering::SeqCst);
        tracing::info!(url = %inner.socket_url, "Opening socket");

        let opened =
            tokio::time::timeout(inner.config.connect_timeout, connect_async(inner.socket_url.as_str())).await;
        let stream = match opened {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => return Err(inner.open_failed(Error::WebSocket(e.to_string())).await),
            Err(_) => return Err(inner.open_failed(Error::ConnectTimeout).await),
        };

        let (sink, stream) = stream.split();
        let current = epoch + 1;
        {
            // disconnect() bumps the epoch before it takes the sink.
            let mut sender = inner.sender.lock().await;
            if inner
                .epoch
                .compare_exchange(epoch, current, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                tracing::debug!("Discarding socket opened after disconnect");
                return Err(Error::ConnectionClosed);
            }
            *sender = Some(sink);
        }

        // Connected before the receive loop exists, so a close it sees
        // always comes after this transition.
        inner.connection.connected().await;

        let receive = tokio::spawn(Inner::receive_loop(Arc::downgrade(inner), stream, current));
        let heartbeat = inner
            .config
            .enable_heartbeat
            .then(|| tokio::spawn(Inner::heartbeat_loop(Arc::downgrade(inner), inner.config.heartbeat_interval)));
        let (stale, raced) = {
            let mut tasks = inner.tasks();
            if inner.epoch.load(Ordering::SeqCst) == current {
                let replaced = [
                    tasks.receive.replace(receive),
                    std::mem::replace(&mut tasks.heartbeat, heartbeat),
                ];
                (replaced, false)
            } else {
                ([Some(receive), heartbeat], true)
            }
        };
        for handle in stale.into_iter().flatten() {
            handle.abort();
        }
        if raced {
            inner.connection.disconnected().await;
            return Err(Error::ConnectionClosed);
        }

        inner.record_state(ConnectionState::Connected);
        tracing::info!("Socket connected");
        inner.events.emit(ClientEvent::Connect);
        Ok(())
    }

    async fn open_failed(&self, error: Error) -> Error {
        self.connection.failed().await;
        self.record_state(ConnectionState::Error);
        tracing::warn!(error = %error, "Socket open failed");
        self.events.emit(ClientEvent::Error(error.to_string()));
        error
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let mut sender = self.sender.lock().await;
        let sink = sender.as_mut().ok_or(Error::NotConnected)?;
        sink.send(Message::Text(text))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }

    async fn socket_call(
        inner: &Arc<Inner>,
        method: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> Result<Value> {
        let start = Instant::now();
        let result = Inner::socket_exchange(inner, method, params, options).await;
        inner.record_call(method, Transport::Socket, &result, start);
        result
    }

    async fn socket_exchange(
        inner: &Arc<Inner>,
        method: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> Result<Value> {
        if !inner.connection.is_connected().await {
            if !inner.config.auto_connect {
                return Err(Error::NotConnected);
            }
            Inner::establish(inner).await?;
        }

        if options.notification {
            let text = codec::encode(&JsonRpcNotification::new(method, params))?;
            inner.send_text(text).await?;
            return Ok(Value::Null);
        }

        let id = inner.requests.next_id();
        let text = codec::encode(&JsonRpcRequest::new(method, params, id.clone()))?;

        // Registered before sending so a fast reply always finds its entry.
        let rx = inner.requests.register(&id).await;
        if let Err(error) = inner.send_text(text).await {
            inner.requests.cancel(&id).await;
            return Err(error);
        }
        tracing::debug!(id = %id, "Call sent, waiting for reply");

        let timeout = options.timeout.unwrap_or(inner.config.request_timeout);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply?.into_result(),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                inner.requests.cancel(&id).await;
                Err(Error::Timeout {
                    method: method.to_string(),
                })
            }
        }
    }

    async fn http_call(&self, method: &str, params: Option<Value>, options: CallOptions) -> Result<Value> {
        let start = Instant::now();
        let result = self.http_exchange(method, params, options).await;
        self.record_call(method, Transport::Http, &result, start);
        result
    }

    async fn http_exchange(&self, method: &str, params: Option<Value>, options: CallOptions) -> Result<Value> {
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);
        let timed_out = || Error::Timeout {
            method: method.to_string(),
        };

        if options.notification {
            let body = codec::encode(&JsonRpcNotification::new(method, params))?;
            tokio::time::timeout(timeout, self.http.post(body))
                .await
                .map_err(|_| timed_out())??;
            return Ok(Value::Null);
        }

        let id = self.requests.next_id();
        let body = codec::encode(&JsonRpcRequest::new(method, params, id.clone()))?;
        let reply = tokio::time::timeout(timeout, self.http.post(body))
            .await
            .map_err(|_| timed_out())??
            .ok_or_else(|| Error::InvalidResponse("empty reply body".to_string()))?;

        let mut replies = codec::responses_from_value(&reply);
        let key = id_to_key(&id);
        if let Some(index) = replies.iter().position(|r| id_to_key(&r.id) == key) {
            return replies.swap_remove(index).into_result();
        }
        // Errors for unparseable requests come back with a null id.
        match replies.into_iter().find(|r| r.is_error()) {
            Some(reply) => reply.into_result(),
            None => Err(Error::InvalidResponse(format!("no reply for id {}", id))),
        }
    }

    async fn handle_text(&self, text: &str) {
        let value = match codec::decode_value(text) {
            Ok(value) => value,
            Err(_) => {
                tracing::debug!("Ignoring non-JSON frame");
                return;
            }
        };

        for reply in codec::responses_from_value(&value) {
            self.requests.complete(reply).await;
        }
        self.events.emit(ClientEvent::Message(value));
    }

    async fn receive_loop(weak: Weak<Inner>, mut stream: SplitStream<WsStream>, epoch: u64) {
        while let Some(frame) = stream.next().await {
            let Some(inner) = weak.upgrade() else { return };
            match frame {
                Ok(Message::Text(text)) => inner.handle_text(&text).await,
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Socket closed by server");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Socket read failed");
                    break;
                }
            }
        }

        if let Some(inner) = weak.upgrade() {
            Inner::handle_close(&inner, epoch).await;
        }
    }

    async fn handle_close(inner: &Arc<Inner>, epoch: u64) {
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        tracing::warn!("Socket closed unexpectedly");

        inner.sender.lock().await.take();
        let heartbeat = inner.tasks().heartbeat.take();
        if let Some(handle) = heartbeat {
            handle.abort();
        }

        inner.connection.disconnected().await;
        inner.record_state(ConnectionState::Disconnected);
        let rejected = inner.requests.fail_all(Error::ConnectionClosed).await;
        tracing::debug!(rejected, "Rejected in-flight calls");
        inner.events.emit(ClientEvent::Disconnect);

        if inner.auto_reconnect.load(Ordering::SeqCst) {
            let handle = tokio::spawn(Inner::reconnect_loop(Arc::downgrade(inner)));
            let previous = inner.tasks().reconnect.replace(handle);
            if let Some(previous) = previous {
                previous.abort();
            }
        }
    }

    async fn reconnect_loop(weak: Weak<Inner>) {
        loop {
            let delay = {
                let Some(inner) = weak.upgrade() else { return };
                if !inner.auto_reconnect.load(Ordering::SeqCst) {
                    return;
                }
                match inner.connection.next_reconnect().await {
                    Some((attempt, delay)) => {
                        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
                        inner.record_state(ConnectionState::Reconnecting { attempt });
                        if let Some(m) = &inner.metrics {
                            m.record_reconnection_attempt();
                        }
                        inner.events.emit(ClientEvent::Reconnecting(attempt));
                        delay
                    }
                    None => {
                        tracing::error!("Reconnection abandoned (max attempts reached)");
                        inner.record_state(ConnectionState::Disconnected);
                        return;
                    }
                }
            };

            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else { return };
            if !inner.auto_reconnect.load(Ordering::SeqCst) {
                return;
            }
            match Inner::establish(&inner).await {
                Ok(()) => {
                    if let Some(m) = &inner.metrics {
                        m.record_reconnection_success();
                    }
                    tracing::info!("Reconnected");
                    return;
                }
                Err(e) => tracing::warn!(error = %e, "Reconnect attempt failed"),
            }
        }
    }

    async fn heartbeat_loop(weak: Weak<Inner>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else { return };

            let ping = JsonRpcNotification::new(
                HEARTBEAT_METHOD,
                Some(json!({ "timestamp": chrono::Utc::now().timestamp_millis() })),
            );
            let sent = match codec::encode(&ping) {
                Ok(text) => inner.send_text(text).await,
                Err(e) => Err(e),
            };
            match sent {
                Ok(()) => {
                    if let Some(m) = &inner.metrics {
                        m.record_heartbeat();
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Heartbeat send failed"),
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let tasks = match self.tasks.get_mut() {
            Ok(tasks) => std::mem::take(tasks),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };
        tasks.abort_all();
    }
}

fn to_params<P: Serialize>(params: P) -> Result<Option<Value>> {
    let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok((!value.is_null()).then_some(value))
}

fn from_value<R: DeserializeOwned>(value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
}
