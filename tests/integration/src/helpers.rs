//! Test helpers for integration tests
//!
//! Provides an in-process socket server: it checks the `token` query
//! parameter, greets each client, echoes text frames back (heartbeats are
//! counted instead), and can drop every client on demand.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde_json::json;
use tether_client::Deployment;
use tether_core::Envelope;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Close code sent when the server drops its clients
pub const GOING_AWAY: u16 = 1001;

/// Type of the greeting frame sent on every new connection
pub const WELCOME: &str = "welcome";

#[derive(Clone)]
struct ServerState {
    accepted: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    heartbeats: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<String>>>,
    kick: broadcast::Sender<()>,
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    state: ServerState,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server on an ephemeral port
    pub async fn start() -> Result<Self> {
        let (kick, _) = broadcast::channel(16);
        let state = ServerState {
            accepted: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            heartbeats: Arc::new(AtomicUsize::new(0)),
            tokens: Arc::new(Mutex::new(Vec::new())),
            kick,
        };

        let app = Router::new()
            .route("/ws", get(socket_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get a direct deployment pointing at this server
    pub fn deployment(&self) -> Deployment {
        Deployment::direct("127.0.0.1", Some(self.addr.port()), false)
    }

    /// Get the number of sockets accepted so far
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Get the number of sockets currently open
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Get the number of heartbeat frames received
    pub fn heartbeats(&self) -> usize {
        self.state.heartbeats.load(Ordering::SeqCst)
    }

    /// Get the tokens presented by each accepted socket
    pub fn tokens(&self) -> Vec<String> {
        self.state.tokens.lock().clone()
    }

    /// Close every open socket with `GOING_AWAY`
    pub fn drop_clients(&self) {
        let _ = self.state.kick.send(());
    }
}

/// Bind a port and release it, yielding an address nobody listens on
pub async fn dead_addr() -> Result<SocketAddr> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    Ok(listener.local_addr()?)
}

/// Poll `condition` until it holds or `within` elapses
pub async fn eventually(within: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

async fn socket_handler(
    State(state): State<ServerState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = params.get("token").filter(|t| !t.is_empty()).cloned() else {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(state, socket, token))
}

async fn handle_socket(state: ServerState, mut socket: WebSocket, token: String) {
    let mut kick = state.kick.subscribe();
    state.accepted.fetch_add(1, Ordering::SeqCst);
    state.active.fetch_add(1, Ordering::SeqCst);
    state.tokens.lock().push(token.clone());

    let welcome = json!({
        "type": WELCOME,
        "sessionId": uuid::Uuid::new_v4().to_string(),
        "token": token,
    });
    if socket.send(Message::Text(welcome.to_string())).await.is_err() {
        state.active.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let is_heartbeat = Envelope::from_json(&text)
                            .is_ok_and(|env| env.is(tether_core::entities::HEARTBEAT));
                        if is_heartbeat {
                            state.heartbeats.fetch_add(1, Ordering::SeqCst);
                        } else if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = kick.recv() => {
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: GOING_AWAY,
                        reason: "going away".into(),
                    })))
                    .await;
                break;
            }
        }
    }

    state.active.fetch_sub(1, Ordering::SeqCst);
}
