//! Socket lifecycle: disconnect, reconnect, heartbeat and events

mod common;

use common::MockWsServer;
use livewire_client::{
    CallOptions, ClientBuilder, ClientEvent, ConnectionState, RpcClient, SharedClient, HEARTBEAT_METHOD,
};
use livewire_core::Error;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn builder(server: &MockWsServer) -> ClientBuilder {
    ClientBuilder::new(common::dead_url())
        .socket_url(server.url())
        .auto_connect(false)
        .heartbeat(false)
        .http_fallback(false)
}

/// Record every non-message event the client emits
fn record_events(client: &RpcClient) -> Arc<Mutex<Vec<ClientEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    client.on_event(move |event| {
        if !matches!(event, ClientEvent::Message(_)) {
            sink.lock().unwrap().push(event.clone());
        }
    });
    events
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let server = MockWsServer::silent().await;
    let client = builder(&server).build().unwrap();
    let events = record_events(&client);

    client.connect().await.unwrap();
    client.connect().await.unwrap();

    assert_eq!(client.state().await, ConnectionState::Connected);
    assert_eq!(server.connections(), 1);
    assert_eq!(*events.lock().unwrap(), vec![ClientEvent::Connect]);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_rejects_pending_calls() {
    let server = MockWsServer::silent().await;
    let client = builder(&server).build().unwrap();
    client.connect().await.unwrap();

    let caller = client.clone();
    let pending = tokio::spawn(async move {
        caller
            .call_via_socket::<_, Value>("common:getNodes", (), CallOptions::default())
            .await
    });

    wait_until(|| {
        let client = client.clone();
        async move { client.pending_calls().await == 1 }
    })
    .await;

    client.disconnect().await;
    client.disconnect().await;

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert_eq!(client.pending_calls().await, 0);
    assert_eq!(client.state().await, ConnectionState::Disconnected);

    // A fresh connect works after an explicit disconnect.
    client.connect().await.unwrap();
    assert_eq!(client.state().await, ConnectionState::Connected);
    assert_eq!(server.connections(), 2);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_unexpected_close() {
    let server = MockWsServer::silent().await;
    let client = builder(&server)
        .reconnect_interval(Duration::from_millis(50))
        .build()
        .unwrap();
    let events = record_events(&client);
    client.connect().await.unwrap();

    server.kick();

    wait_until(|| {
        let events = Arc::clone(&events);
        async move { events.lock().unwrap().iter().filter(|e| **e == ClientEvent::Connect).count() == 2 }
    })
    .await;

    assert_eq!(server.connections(), 2);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            ClientEvent::Connect,
            ClientEvent::Disconnect,
            ClientEvent::Reconnecting(1),
            ClientEvent::Connect,
        ]
    );

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_close_rejects_in_flight_calls() {
    let server = MockWsServer::silent().await;
    let client = builder(&server).auto_reconnect(false).build().unwrap();
    client.connect().await.unwrap();

    let caller = client.clone();
    let pending = tokio::spawn(async move {
        caller
            .call_via_socket::<_, Value>("common:getNodes", (), CallOptions::default())
            .await
    });
    wait_until(|| {
        let client = client.clone();
        async move { client.pending_calls().await == 1 }
    })
    .await;

    server.kick();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(Error::ConnectionClosed)));
    server.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_gives_up_after_max_attempts() {
    let server = MockWsServer::silent().await;
    let client = builder(&server)
        .reconnect_interval(Duration::from_millis(50))
        .max_reconnect_attempts(2)
        .connect_timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let events = record_events(&client);
    client.connect().await.unwrap();

    server.shutdown().await;

    let attempts = |events: &Arc<Mutex<Vec<ClientEvent>>>| -> Vec<u32> {
        events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Reconnecting(n) => Some(*n),
                _ => None,
            })
            .collect()
    };

    wait_until(|| {
        let client = client.clone();
        let seen = attempts(&events);
        async move { seen.len() == 2 && client.state().await == ConnectionState::Disconnected }
    })
    .await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(attempts(&events), vec![1, 2]);
    assert_eq!(client.state().await, ConnectionState::Disconnected);

    let failures = events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, ClientEvent::Error(_)))
        .count();
    assert_eq!(failures, 2);
}

#[tokio::test]
async fn test_disconnect_cancels_pending_reconnect() {
    let server = MockWsServer::silent().await;
    let client = builder(&server)
        .reconnect_interval(Duration::from_millis(300))
        .build()
        .unwrap();
    let events = record_events(&client);
    client.connect().await.unwrap();

    server.kick();
    wait_until(|| {
        let events = Arc::clone(&events);
        async move { events.lock().unwrap().contains(&ClientEvent::Reconnecting(1)) }
    })
    .await;

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(server.connections(), 1);
    assert_eq!(client.state().await, ConnectionState::Disconnected);
    server.shutdown().await;
}

#[tokio::test]
async fn test_heartbeat_ping() {
    let mut server = MockWsServer::silent().await;
    let client = builder(&server)
        .heartbeat(true)
        .heartbeat_interval(Duration::from_millis(100))
        .build()
        .unwrap();
    client.connect().await.unwrap();

    let ping = server.next_message().await.unwrap();
    assert_eq!(ping["method"], HEARTBEAT_METHOD);
    assert!(ping.get("id").is_none());
    assert!(ping["params"]["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(client.pending_calls().await, 0);

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_message_events() {
    let server = MockWsServer::replying(json!({"ok": true})).await;
    let client = builder(&server).build().unwrap();

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    client.on_event(move |event| {
        if let ClientEvent::Message(value) = event {
            sink.lock().unwrap().push(value.clone());
        }
    });
    client.connect().await.unwrap();

    let _: Value = client.call("common:getNodes", (), CallOptions::default()).await.unwrap();
    wait_until(|| {
        let messages = Arc::clone(&messages);
        async move { !messages.lock().unwrap().is_empty() }
    })
    .await;

    let seen = messages.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["result"], json!({"ok": true}));

    client.disconnect().await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_right_after_build_stays_closed() {
    let server = MockWsServer::silent().await;
    let client = builder(&server).auto_connect(true).build().unwrap();
    let events = record_events(&client);

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(client.state().await, ConnectionState::Disconnected);
    assert!(!client.is_connected().await);
    assert!(!events.lock().unwrap().contains(&ClientEvent::Connect));

    server.shutdown().await;
}

#[tokio::test]
async fn test_shared_client_lifecycle() {
    let server = MockWsServer::silent().await;
    let shared = SharedClient::new(builder(&server).build().unwrap());

    let first = shared.attach().await;
    let second = shared.attach().await;
    assert!(first.is_connected().await);
    assert_eq!(server.connections(), 1);

    shared.detach().await;
    assert!(second.is_connected().await);

    shared.detach().await;
    assert_eq!(first.state().await, ConnectionState::Disconnected);

    server.shutdown().await;
}
