//! WebSocket transport over tokio-tungstenite

use super::{transport_channel, Connector, OutboundFrame, TransportError, TransportEvent, TransportHandle};
use crate::resolver::ConnectionTarget;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Dials real WebSocket servers
///
/// Each open socket is driven by two tasks: a writer draining the outbound
/// channel into the sink and a reader converting stream items into
/// [`TransportEvent`]s. Dropping the outbound sender closes the socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, target: &ConnectionTarget) -> Result<TransportHandle, TransportError> {
        let url = target
            .dial_url()
            .map_err(|e| TransportError::InvalidTarget(e.to_string()))?;

        let (ws_stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        tracing::debug!(
            uri = %target,
            status = %response.status(),
            "WebSocket handshake complete"
        );

        let (sink, source) = ws_stream.split();
        let (handle, side) = transport_channel();

        tokio::spawn(write_loop(sink, side.outbound, side.inbound.clone()));
        tokio::spawn(read_loop(source, side.inbound));

        Ok(handle)
    }
}

/// Drain outbound frames into the socket until asked to close
async fn write_loop(
    mut sink: WsSink,
    mut frames: mpsc::Receiver<OutboundFrame>,
    events: mpsc::Sender<TransportEvent>,
) {
    while let Some(frame) = frames.recv().await {
        match frame {
            OutboundFrame::Text(text) => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::warn!(error = %e, "Failed to write WebSocket frame");
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    return;
                }
            }
            OutboundFrame::Close => break,
        }
    }

    // Close requested or every sender dropped
    let _ = sink.close().await;
}

/// Turn socket items into transport events until the socket ends
async fn read_loop(mut source: WsSource, events: mpsc::Sender<TransportEvent>) {
    while let Some(item) = source.next().await {
        let event = match item {
            Ok(Message::Text(text)) => TransportEvent::Frame(text),
            Ok(Message::Binary(bytes)) => {
                tracing::warn!(len = bytes.len(), "Dropping binary frame");
                continue;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Ok(Message::Close(frame)) => {
                let (code, reason) = frame
                    .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                    .unwrap_or((None, String::new()));
                let _ = events.send(TransportEvent::Closed { code, reason }).await;
                return;
            }
            Err(e) => {
                let _ = events.send(TransportEvent::Error(e.to_string())).await;
                return;
            }
        };

        if events.send(event).await.is_err() {
            // Manager side is gone
            return;
        }
    }

    let _ = events
        .send(TransportEvent::Closed {
            code: None,
            reason: String::new(),
        })
        .await;
}
