//! Interactive execution sessions over WebSocket.
//!
//! A session owns two background tasks:
//!
//! ```text
//!  SessionSender (Clone) ──mpsc──▶ writer task ──▶ WebSocket sink
//!                                      │
//!                                 shutdown (watch)
//!                                      │
//!  SessionReceiver ◀──mpsc── reader task ◀── WebSocket stream
//! ```
//!
//! Every frame goes through the single writer task, so concurrent sends never
//! interleave. The reader task forwards frames in arrival order. Either task
//! ending flips the shutdown flag, which stops the other one; once the reader
//! is gone, `recv` returns `None`. The writer always ends by sending a close
//! frame, so dropping every sender, or the receiver, closes the socket.

use crate::error::CoduxError;
use crate::transport::Transport;
use codux_protocol::{ClientMessage, ServerMessage};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Path of the interactive endpoint, relative to the base URL.
const CONNECT_ENDPOINT: &str = "connect";

/// Queued outgoing frames before `send` waits.
const OUTGOING_BUFFER: usize = 32;

/// Received frames buffered ahead of `recv`.
const INCOMING_BUFFER: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
enum Outgoing {
    Message(ClientMessage, oneshot::Sender<Result<(), CoduxError>>),
    Close(oneshot::Sender<Result<(), CoduxError>>),
}

/// An open interactive session.
///
/// Use [`split`](Self::split) to drive sending and receiving from separate
/// tasks.
#[derive(Debug)]
pub struct Session {
    sender: SessionSender,
    receiver: SessionReceiver,
}

/// Sending half of a [`Session`]. Clones share the same writer.
///
/// Dropping every clone closes the session.
#[derive(Debug, Clone)]
pub struct SessionSender {
    outgoing: mpsc::Sender<Outgoing>,
}

/// Receiving half of a [`Session`]. Dropping it closes the session.
#[derive(Debug)]
pub struct SessionReceiver {
    incoming: mpsc::Receiver<Result<ServerMessage, CoduxError>>,
}

impl Session {
    /// Open a session against the transport's base URL.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`. The handshake carries
    /// the transport's default headers overlaid with `headers`, and is
    /// bounded by the transport timeout.
    pub(crate) async fn connect(
        transport: &Transport,
        headers: Option<&HeaderMap>,
    ) -> Result<Self, CoduxError> {
        let url = websocket_url(transport.base_url())?;
        tracing::debug!(url = %url, "Connecting interactive session");

        let mut request = url.as_str().into_client_request()?;
        request
            .headers_mut()
            .extend(transport.merged_headers(headers));

        let start = std::time::Instant::now();
        let (stream, _response) = tokio::time::timeout(transport.timeout(), connect_async(request))
            .await
            .map_err(|_| {
                tracing::warn!(
                    url = %url,
                    timeout_secs = transport.timeout().as_secs(),
                    "Session handshake timeout"
                );
                CoduxError::transport(format!(
                    "websocket handshake timed out after {:?}",
                    transport.timeout()
                ))
            })??;

        tracing::info!(
            url = %url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Interactive session connected"
        );

        Ok(Self::spawn(stream))
    }

    fn spawn(stream: WsStream) -> Self {
        let (sink, stream) = stream.split();
        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_BUFFER);
        let (incoming_tx, incoming_rx) = mpsc::channel(INCOMING_BUFFER);
        let (shutdown, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown);

        tokio::spawn(write_loop(sink, outgoing_rx, Arc::clone(&shutdown)));
        tokio::spawn(read_loop(stream, incoming_tx, shutdown));

        Self {
            sender: SessionSender {
                outgoing: outgoing_tx,
            },
            receiver: SessionReceiver {
                incoming: incoming_rx,
            },
        }
    }

    /// Send a message. See [`SessionSender::send`].
    pub async fn send(&self, message: ClientMessage) -> Result<(), CoduxError> {
        self.sender.send(message).await
    }

    /// Receive the next message. See [`SessionReceiver::recv`].
    pub async fn recv(&mut self) -> Option<Result<ServerMessage, CoduxError>> {
        self.receiver.recv().await
    }

    /// Close the session. See [`SessionSender::close`].
    pub async fn close(&self) -> Result<(), CoduxError> {
        self.sender.close().await
    }

    /// Another handle to the sending half.
    pub fn sender(&self) -> SessionSender {
        self.sender.clone()
    }

    /// Split into independently owned halves.
    pub fn split(self) -> (SessionSender, SessionReceiver) {
        (self.sender, self.receiver)
    }
}

impl SessionSender {
    /// Send a message and wait until it is written to the socket.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` once the session has shut down, or a
    /// `TransportFailure` if the write fails (which also ends the session).
    pub async fn send(&self, message: ClientMessage) -> Result<(), CoduxError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Message(message, ack_tx))
            .await
            .map_err(|_| CoduxError::SessionClosed)?;
        ack_rx.await.map_err(|_| CoduxError::SessionClosed)?
    }

    /// Close the session.
    ///
    /// Sends a close frame and wakes any pending `recv` with `None`.
    /// Closing an already closed session succeeds.
    pub async fn close(&self) -> Result<(), CoduxError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.outgoing.send(Outgoing::Close(ack_tx)).await.is_err() {
            return Ok(());
        }
        ack_rx.await.unwrap_or(Ok(()))
    }

    /// Check whether the writer has shut down.
    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}

impl SessionReceiver {
    /// Receive the next message, in arrival order.
    ///
    /// Returns `None` once the session is closed, by either side. A dropped
    /// connection yields one `Err(TransportFailure)` first. A frame that is
    /// not JSON yields an `Err` and the session continues.
    pub async fn recv(&mut self) -> Option<Result<ServerMessage, CoduxError>> {
        self.incoming.recv().await
    }
}

/// Derive the `/connect` WebSocket URL from an HTTP base URL.
fn websocket_url(base_url: &str) -> Result<String, CoduxError> {
    let (scheme, rest) = if let Some(rest) = base_url.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(CoduxError::InvalidConfig(format!(
            "cannot derive websocket URL from {base_url}"
        )));
    };
    Ok(format!("{scheme}://{rest}/{CONNECT_ENDPOINT}"))
}

async fn write_loop(
    mut sink: SplitSink<WsStream, WsMessage>,
    mut outgoing: mpsc::Receiver<Outgoing>,
    shutdown: Arc<watch::Sender<bool>>,
) {
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        let command = tokio::select! {
            _ = shut_down(&mut shutdown_rx) => {
                tracing::debug!("Session writer stopping");
                break;
            }
            command = outgoing.recv() => command,
        };

        match command {
            Some(Outgoing::Message(message, ack)) => {
                let result = write_message(&mut sink, &message).await;
                let failed = result.is_err();
                let _ = ack.send(result);
                if failed {
                    break;
                }
            }
            Some(Outgoing::Close(ack)) => {
                tracing::debug!("Closing interactive session");
                let result = close_sink(&mut sink).await;
                outgoing.close();
                shutdown.send_replace(true);
                let _ = ack.send(result);
                return;
            }
            None => {
                tracing::debug!("All session senders dropped");
                break;
            }
        }
    }

    // Frames still queued are dropped; their senders see SessionClosed
    outgoing.close();
    shutdown.send_replace(true);
    if let Err(e) = close_sink(&mut sink).await {
        tracing::debug!(error = %e, "Session close frame not sent");
    }
}

async fn close_sink(sink: &mut SplitSink<WsStream, WsMessage>) -> Result<(), CoduxError> {
    match sink.close().await {
        Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
        Err(e) => Err(CoduxError::from(e)),
    }
}

async fn write_message(
    sink: &mut SplitSink<WsStream, WsMessage>,
    message: &ClientMessage,
) -> Result<(), CoduxError> {
    let payload = serde_json::to_string(message)
        .map_err(|e| CoduxError::transport(format!("failed to encode session message: {e}")))?;
    tracing::trace!(payload = %payload, "Session frame out");
    sink.send(WsMessage::Text(payload.into()))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Session write failed");
            CoduxError::from(e)
        })
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    incoming: mpsc::Sender<Result<ServerMessage, CoduxError>>,
    shutdown: Arc<watch::Sender<bool>>,
) {
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        let frame = tokio::select! {
            _ = shut_down(&mut shutdown_rx) => {
                tracing::debug!("Session reader stopping");
                break;
            }
            _ = incoming.closed() => {
                tracing::debug!("Session receiver dropped");
                break;
            }
            frame = stream.next() => frame,
        };

        let item = match frame {
            Some(Ok(WsMessage::Text(text))) => {
                tracing::trace!(payload = %text.as_str(), "Session frame in");
                parse_frame(text.as_str())
            }
            Some(Ok(WsMessage::Binary(data))) => match std::str::from_utf8(&data) {
                Ok(text) => parse_frame(text),
                Err(e) => Err(CoduxError::transport(format!(
                    "binary session frame is not UTF-8: {e}"
                ))),
            },
            Some(Ok(WsMessage::Close(frame))) => {
                tracing::debug!(frame = ?frame, "Service closed interactive session");
                break;
            }
            Some(Ok(_)) => continue,
            None | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                tracing::debug!("Interactive session stream ended");
                break;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Interactive session dropped");
                let _ = incoming.send(Err(CoduxError::from(e))).await;
                break;
            }
        };

        if incoming.send(item).await.is_err() {
            tracing::debug!("Session receiver dropped");
            break;
        }
    }

    shutdown.send_replace(true);
}

async fn shut_down(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closed| *closed).await;
}

fn parse_frame(text: &str) -> Result<ServerMessage, CoduxError> {
    ServerMessage::parse(text).map_err(|e| {
        tracing::warn!(error = %e, "Malformed session frame");
        CoduxError::transport(format!("malformed session frame: {e}"))
    })
}
