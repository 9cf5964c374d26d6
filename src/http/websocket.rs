//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests
//! - Complete upgrade handshake with client
//! - Establish WebSocket connection to the origin
//! - Bidirectional message forwarding
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket messages ────→ Proxy ←──── WebSocket messages ────→ Origin
//! ```
//!
//! # Design Decisions
//! - WebSocket handled separately from HTTP request/response (no capture)
//! - Text and binary messages relayed verbatim; ping/pong answered per hop
//! - client→origin runs in a spawned task, origin→client in the upgrade task
//! - The two directions share only a close flag; closing is idempotent

use std::fmt::Display;
use std::str::Utf8Error;
use std::sync::Arc;

use axum::extract::ws::{Message as ClientMessage, WebSocket, WebSocketUpgrade};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message as OriginMessage;

use crate::observability::metrics;

/// True if the request asks for a WebSocket upgrade.
///
/// `Connection` must carry the `upgrade` token and `Upgrade` must name
/// `websocket`, both compared case-insensitively.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    let upgrade_websocket = headers
        .get_all(header::UPGRADE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("websocket"));

    connection_upgrade && upgrade_websocket
}

/// Complete the client upgrade and bridge it to `origin_url`.
pub fn bridge(ws: WebSocketUpgrade, origin_url: String, request_id: String) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, origin_url, request_id))
}

/// Relay direction, used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToOrigin,
    OriginToClient,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::ClientToOrigin => "client_to_origin",
            Direction::OriginToClient => "origin_to_client",
        }
    }
}

/// Close signal shared by both directions of a session.
///
/// `close` may be called any number of times from either direction.
#[derive(Debug, Clone)]
pub struct SessionCloser {
    tx: Arc<watch::Sender<bool>>,
}

impl SessionCloser {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for SessionCloser {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_session(client: WebSocket, origin_url: String, request_id: String) {
    let origin = match tokio_tungstenite::connect_async(origin_url.as_str()).await {
        Ok((origin, _)) => origin,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                origin = %origin_url,
                error = %e,
                "Failed to dial origin websocket"
            );
            let mut client = client;
            let _ = SinkExt::close(&mut client).await;
            return;
        }
    };

    tracing::info!(request_id = %request_id, origin = %origin_url, "WebSocket session established");
    metrics::websocket_session_opened();

    let (client_tx, client_rx) = client.split();
    let (origin_tx, origin_rx) = origin.split();
    let closer = SessionCloser::new();

    let upstream = tokio::spawn(relay(
        Direction::ClientToOrigin,
        client_rx,
        origin_tx,
        closer.clone(),
    ));
    let downstream = relay(Direction::OriginToClient, origin_rx, client_tx, closer).await;
    let upstream = upstream.await.unwrap_or_else(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Relay task failed");
        0
    });

    metrics::websocket_session_closed();
    tracing::info!(
        request_id = %request_id,
        client_to_origin = upstream,
        origin_to_client = downstream,
        "WebSocket session closed"
    );
}

/// A relayed data message, independent of which side's type carries it.
///
/// Text payloads stay as the UTF-8 bytes they arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Text(Bytes),
    Binary(Bytes),
}

enum Inbound {
    Data(Frame),
    Control,
    Close,
}

/// Conversion between a connection's message type and [`Frame`].
trait RelayMessage: Sized {
    fn classify(self) -> Inbound;
    fn from_frame(frame: Frame) -> Result<Self, Utf8Error>;
}

impl RelayMessage for ClientMessage {
    fn classify(self) -> Inbound {
        match self {
            ClientMessage::Text(text) => Inbound::Data(Frame::Text(text.into())),
            ClientMessage::Binary(data) => Inbound::Data(Frame::Binary(data)),
            ClientMessage::Ping(_) | ClientMessage::Pong(_) => Inbound::Control,
            ClientMessage::Close(_) => Inbound::Close,
        }
    }

    fn from_frame(frame: Frame) -> Result<Self, Utf8Error> {
        Ok(match frame {
            Frame::Text(text) => ClientMessage::Text(text.try_into()?),
            Frame::Binary(data) => ClientMessage::Binary(data),
        })
    }
}

impl RelayMessage for OriginMessage {
    fn classify(self) -> Inbound {
        match self {
            OriginMessage::Text(text) => Inbound::Data(Frame::Text(text.into())),
            OriginMessage::Binary(data) => Inbound::Data(Frame::Binary(data)),
            OriginMessage::Ping(_) | OriginMessage::Pong(_) | OriginMessage::Frame(_) => {
                Inbound::Control
            }
            OriginMessage::Close(_) => Inbound::Close,
        }
    }

    fn from_frame(frame: Frame) -> Result<Self, Utf8Error> {
        Ok(match frame {
            Frame::Text(text) => OriginMessage::Text(text.try_into()?),
            Frame::Binary(data) => OriginMessage::Binary(data),
        })
    }
}

/// Pump messages from `source` into `sink` until either side fails, a close
/// frame arrives, or the other direction closes the session.
///
/// Returns the number of messages relayed.
async fn relay<S, K, In, Out, ReadErr>(
    direction: Direction,
    mut source: S,
    mut sink: K,
    closer: SessionCloser,
) -> u64
where
    S: Stream<Item = Result<In, ReadErr>> + Unpin,
    K: Sink<Out> + Unpin,
    <K as Sink<Out>>::Error: Display,
    In: RelayMessage,
    Out: RelayMessage,
    ReadErr: Display,
{
    let mut closed = closer.subscribe();
    let mut relayed = 0u64;

    loop {
        if *closed.borrow_and_update() {
            break;
        }
        let next = tokio::select! {
            _ = closed.changed() => continue,
            next = source.next() => next,
        };

        let frame = match next {
            Some(Ok(message)) => match message.classify() {
                Inbound::Data(frame) => frame,
                Inbound::Control => continue,
                Inbound::Close => {
                    tracing::debug!(direction = direction.as_str(), "Close frame received");
                    break;
                }
            },
            Some(Err(e)) => {
                tracing::debug!(direction = direction.as_str(), error = %e, "WebSocket read failed");
                break;
            }
            None => {
                tracing::debug!(direction = direction.as_str(), "WebSocket stream ended");
                break;
            }
        };

        let message = match Out::from_frame(frame) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(direction = direction.as_str(), error = %e, "Invalid text frame");
                break;
            }
        };
        if let Err(e) = sink.send(message).await {
            tracing::debug!(direction = direction.as_str(), error = %e, "WebSocket write failed");
            break;
        }
        relayed += 1;
        metrics::websocket_message_relayed(direction.as_str());
    }

    closer.close();
    let _ = sink.close().await;
    relayed
}
