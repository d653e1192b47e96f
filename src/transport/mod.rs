//! WebSocket transport to the debug bridge.
//!
//! A background task owns the socket. It connects, forwards every inbound
//! text frame as a [`TransportEvent::Message`], and when the channel drops
//! it waits one fixed interval before trying again, indefinitely.
//!
//! # Lifecycle
//!
//! 1. Connect to `ws[s]://host:port/websockets/debug`
//! 2. Emit [`TransportEvent::Open`]; outbound sends are accepted from now on
//! 3. Pump frames both ways until the socket closes or errors
//! 4. Emit [`TransportEvent::Closed`], schedule one retry, go to 1
//!
//! The task ends when the event receiver is dropped or
//! [`TransportHandle::close`] is called.

pub mod connection;

use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, connect_async};

pub use connection::{Connection, ConnectionState, RECONNECT_INTERVAL_MS};

/// Type alias for the WebSocket stream type.
type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Default bridge port
pub const DEFAULT_PORT: u16 = 8025;

/// Path of the debug channel on the bridge
pub const ENDPOINT_PATH: &str = "/websockets/debug";

/// Where the bridge listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// Use `wss` instead of `ws`
    pub secure: bool,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { "wss" } else { "ws" }
    }

    pub fn url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.host,
            self.port,
            ENDPOINT_PATH
        )
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT, false)
    }
}

/// Lifecycle and data notifications from the transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Closed,
    Error(String),
}

/// Anything raw frames can be written to.
pub trait FrameSink {
    /// Transmit one frame. Dropped silently when the channel is not open.
    fn send_frame(&mut self, raw: String);

    /// Close the channel, best effort.
    fn close(&mut self) {}
}

enum Outbound {
    Frame(String),
    Close,
}

/// Cloneable handle for talking to the transport task.
#[derive(Clone)]
pub struct TransportHandle {
    outbound: mpsc::UnboundedSender<Outbound>,
    state: watch::Receiver<ConnectionState>,
}

impl TransportHandle {
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open()
    }

    /// Send one frame if the channel is open. Never queues for later.
    pub fn send(&self, raw: String) -> bool {
        if !self.is_open() {
            tracing::debug!(frame = %crate::protocol::preview(&raw), "channel not open, frame dropped");
            return false;
        }
        self.outbound.send(Outbound::Frame(raw)).is_ok()
    }

    /// Ask the task to close the socket and stop reconnecting.
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }

    /// Wait until the connection state changes.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}

impl FrameSink for TransportHandle {
    fn send_frame(&mut self, raw: String) {
        self.send(raw);
    }

    fn close(&mut self) {
        TransportHandle::close(self);
    }
}

/// Start the transport task for `endpoint`.
///
/// Returns a handle for sending, the receiver of transport events, and the
/// task's join handle.
pub fn spawn(
    endpoint: &Endpoint,
    interval: Duration,
) -> (
    TransportHandle,
    mpsc::UnboundedReceiver<TransportEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let connection = Connection::new(interval);
    let (state_tx, state_rx) = watch::channel(connection.state().clone());

    let url = endpoint.url();
    let task = tokio::spawn(async move {
        run(url, connection, state_tx, event_tx, outbound_rx).await;
    });

    let handle = TransportHandle {
        outbound: outbound_tx,
        state: state_rx,
    };
    (handle, event_rx, task)
}

/// How one connected session ended.
enum Ended {
    /// Socket dropped or errored; reconnect
    Lost(String),
    /// Client closed on purpose or nobody is listening; stop
    Shutdown,
}

async fn run(
    url: String,
    mut connection: Connection,
    state_tx: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    loop {
        state_tx.send_replace(connection.state().clone());
        // Frames queued while the channel was down are stale.
        while let Ok(msg) = outbound.try_recv() {
            if let Outbound::Close = msg {
                connection.shut_down();
                state_tx.send_replace(connection.state().clone());
                return;
            }
        }

        tracing::info!(%url, attempt = connection.attempts(), "connecting");
        match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                connection.on_open();
                state_tx.send_replace(connection.state().clone());
                tracing::info!(%url, "connected");
                if events.send(TransportEvent::Open).is_err() {
                    return;
                }
                match pump(ws_stream, &events, &mut outbound).await {
                    Ended::Lost(reason) => {
                        tracing::warn!(%reason, "connection lost");
                        let _ = events.send(TransportEvent::Error(reason));
                    }
                    Ended::Shutdown => {
                        connection.shut_down();
                        state_tx.send_replace(connection.state().clone());
                        tracing::info!("transport closed");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "connection failed");
                if events.send(TransportEvent::Error(e.to_string())).is_err() {
                    return;
                }
            }
        }

        let retry_at = connection.on_close(Instant::now());
        state_tx.send_replace(connection.state().clone());
        if events.send(TransportEvent::Closed).is_err() {
            return;
        }
        tracing::info!(
            interval_ms = connection.interval().as_millis() as u64,
            "reconnect scheduled"
        );

        let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(retry_at));
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                _ = events.closed() => return,
                msg = outbound.recv() => match msg {
                    Some(Outbound::Frame(_)) => {}
                    Some(Outbound::Close) | None => {
                        connection.shut_down();
                        state_tx.send_replace(connection.state().clone());
                        return;
                    }
                },
            }
        }
        connection.begin_attempt();
    }
}

async fn pump(
    ws_stream: WsStream,
    events: &mpsc::UnboundedSender<TransportEvent>,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
) -> Ended {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Message(text)).is_err() {
                            return Ended::Shutdown;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => {
                            if events.send(TransportEvent::Message(text)).is_err() {
                                return Ended::Shutdown;
                            }
                        }
                        Err(_) => tracing::debug!("ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            return Ended::Lost(e.to_string());
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Ended::Lost("server closed connection".to_string());
                    }
                    Some(Err(e)) => return Ended::Lost(format!("WebSocket error: {}", e)),
                    _ => {}
                }
            }

            out = outbound.recv() => {
                match out {
                    Some(Outbound::Frame(raw)) => {
                        tracing::debug!(frame = %crate::protocol::preview(&raw), "sending");
                        if let Err(e) = write.send(Message::Text(raw)).await {
                            return Ended::Lost(e.to_string());
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ended::Shutdown;
                    }
                }
            }

            _ = events.closed() => return Ended::Shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            Endpoint::default().url(),
            "ws://localhost:8025/websockets/debug"
        );
        assert_eq!(
            Endpoint::new("debug.example", 443, true).url(),
            "wss://debug.example:443/websockets/debug"
        );
    }

    #[tokio::test]
    async fn test_send_before_open_is_dropped() {
        // Port 9 (discard) on localhost is not a WebSocket server.
        let endpoint = Endpoint::new("127.0.0.1", 9, false);
        let (handle, mut events, task) = spawn(&endpoint, Duration::from_secs(60));
        assert!(!handle.send("get:variables".to_string()));

        // The failed attempt surfaces as an error followed by a scheduled retry.
        let mut saw_closed = false;
        while let Some(event) = events.recv().await {
            if event == TransportEvent::Closed {
                saw_closed = true;
                break;
            }
        }
        assert!(saw_closed);
        assert!(matches!(
            handle.state(),
            ConnectionState::Closed {
                next_retry: Some(_)
            }
        ));
        handle.close();
        let _ = task.await;
    }
}
