//! Client Integration Tests
//!
//! Drive the real WebSocket transport against the in-process server.
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{
    dead_addr, eventually, fast_config, ws_manager, ChannelSubscriber, Observed, TestServer,
    EVENT_TIMEOUT, GOING_AWAY, TEST_IDENTITY, TEST_TOKEN, WELCOME,
};
use serde_json::json;
use tether_client::{Connector, Consumer, Deployment, StaticAuth, UriResolver, WsConnector};
use tether_client::transport::{OutboundFrame, TransportEvent};
use tether_core::{ConnectionError, ConnectionState, DisconnectReason, Envelope};

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_ws_connector_presents_token_and_echoes() {
    let server = TestServer::start().await.expect("Failed to start server");
    let target = tether_client::resolver::resolve_target(Some(TEST_TOKEN), &server.deployment())
        .expect("target");

    let mut handle = WsConnector::new().connect(&target).await.expect("dial");

    let Some(TransportEvent::Frame(text)) = handle.inbound.recv().await else {
        panic!("expected welcome frame");
    };
    let welcome = Envelope::from_json(&text).unwrap();
    assert!(welcome.is(WELCOME));
    assert_eq!(welcome.get("token"), Some(&json!(TEST_TOKEN)));

    handle
        .outbound
        .send(OutboundFrame::Text(r#"{"type":"ping","n":1}"#.to_string()))
        .await
        .unwrap();
    let Some(TransportEvent::Frame(echo)) = handle.inbound.recv().await else {
        panic!("expected echo frame");
    };
    assert_eq!(echo, r#"{"type":"ping","n":1}"#);

    handle.outbound.send(OutboundFrame::Close).await.unwrap();
    assert!(eventually(EVENT_TIMEOUT, || server.active() == 0).await);
}

#[tokio::test]
async fn test_ws_connector_reports_peer_close_code() {
    let server = TestServer::start().await.expect("Failed to start server");
    let target = tether_client::resolver::resolve_target(Some(TEST_TOKEN), &server.deployment())
        .expect("target");
    let mut handle = WsConnector::new().connect(&target).await.expect("dial");
    let _welcome = handle.inbound.recv().await;

    server.drop_clients();

    match tokio::time::timeout(EVENT_TIMEOUT, handle.inbound.recv()).await {
        Ok(Some(TransportEvent::Closed { code, reason })) => {
            assert_eq!(code, Some(GOING_AWAY));
            assert_eq!(reason, "going away");
        }
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ws_connector_fails_against_dead_port() {
    let addr = dead_addr().await.unwrap();
    let deployment = Deployment::direct("127.0.0.1", Some(addr.port()), false);
    let target = tether_client::resolver::resolve_target(Some(TEST_TOKEN), &deployment).unwrap();

    assert!(WsConnector::new().connect(&target).await.is_err());
}

// ============================================================================
// Connection manager
// ============================================================================

#[tokio::test]
async fn test_manager_round_trip() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (manager, _auth) = ws_manager(&server, fast_config());
    let (subscriber, mut events) = ChannelSubscriber::channel();
    let _subscription = manager.subscribe(subscriber);

    manager.connect();
    assert_eq!(events.next().await.unwrap(), Observed::Connect);
    assert!(manager.connection_state().is_connected);

    let welcome = events.next_message().await.unwrap();
    assert!(welcome.is(WELCOME));
    assert_eq!(server.tokens(), vec![TEST_TOKEN.to_string()]);

    let outbound = Envelope::start_stream("prices", json!({"symbols": ["BTC"], "depth": 5}));
    assert!(manager.send_message(&outbound));
    assert_eq!(events.next_message().await.unwrap(), outbound);

    manager.disconnect();
    assert_eq!(
        events.next().await.unwrap(),
        Observed::Disconnect(DisconnectReason::Requested)
    );
    assert!(eventually(EVENT_TIMEOUT, || server.active() == 0).await);
    assert_eq!(manager.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_manager_reconnects_after_server_close() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (manager, _auth) = ws_manager(&server, fast_config());
    let (subscriber, mut events) = ChannelSubscriber::channel();
    let _subscription = manager.subscribe(subscriber);

    manager.connect();
    events.wait_for(|e| *e == Observed::Connect).await.unwrap();

    server.drop_clients();

    let disconnect = events
        .wait_for(|e| matches!(e, Observed::Disconnect(_)))
        .await
        .unwrap();
    assert_eq!(
        disconnect,
        Observed::Disconnect(DisconnectReason::PeerClosed {
            code: Some(GOING_AWAY),
            reason: "going away".to_string(),
        })
    );

    events.wait_for(|e| *e == Observed::Connect).await.unwrap();
    assert_eq!(server.accepted(), 2);
    assert_eq!(manager.attempt_count(), 0);

    manager.disconnect();
}

#[tokio::test]
async fn test_manager_disables_when_server_unreachable() {
    let addr = dead_addr().await.unwrap();
    let auth = Arc::new(StaticAuth::signed_in(TEST_IDENTITY, TEST_TOKEN));
    let resolver = UriResolver::new(Deployment::direct("127.0.0.1", Some(addr.port()), false), auth);
    let manager = tether_client::ConnectionManager::websocket(fast_config(), resolver);
    let (subscriber, mut events) = ChannelSubscriber::channel();
    let _subscription = manager.subscribe(subscriber);

    manager.connect();

    let exhausted = events
        .wait_for(|e| matches!(e, Observed::Error(ConnectionError::Exhausted { .. })))
        .await
        .unwrap();
    assert_eq!(
        exhausted,
        Observed::Error(ConnectionError::Exhausted { attempts: 5 })
    );
    assert_eq!(manager.state(), ConnectionState::Disabled);
}

#[tokio::test]
async fn test_manager_sends_heartbeats() {
    let server = TestServer::start().await.expect("Failed to start server");
    let config = fast_config().with_heartbeat_interval(Duration::from_millis(100));
    let (manager, _auth) = ws_manager(&server, config);

    manager.connect();

    assert!(eventually(EVENT_TIMEOUT, || server.heartbeats() >= 2).await);
    manager.disconnect();
}

// ============================================================================
// Consumers
// ============================================================================

#[tokio::test]
async fn test_consumers_share_one_socket() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (manager, auth) = ws_manager(&server, fast_config());

    let (first, mut first_events) = ChannelSubscriber::channel();
    let (second, mut second_events) = ChannelSubscriber::channel();
    let a = Consumer::mount(&manager, auth.clone(), first);
    let _b = Consumer::mount(&manager, auth.clone(), second);

    first_events.wait_for(|e| *e == Observed::Connect).await.unwrap();
    second_events.wait_for(|e| *e == Observed::Connect).await.unwrap();
    assert_eq!(server.accepted(), 1);

    assert!(a.send_message(&json!({"type": "note", "text": "hello"})));
    let seen_by_second = second_events
        .wait_for(|e| matches!(e, Observed::Message(m) if m.is("note")))
        .await
        .unwrap();
    assert_eq!(
        seen_by_second,
        Observed::Message(Envelope::new("note").with_field("text", "hello"))
    );

    a.disconnect();
}
