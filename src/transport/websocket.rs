//! WebSocket transport and event loop.
//!
//! # Event Loop
//!
//! `connect` spawns a tokio task that handles:
//!
//! - Incoming frames from the server (dispatched to `on_receive`)
//! - Outgoing payloads from the connection
//! - Remote close and socket errors (reported through `on_close`)
//!
//! A stop requested through [`Transport::stop`] clears the handlers first,
//! so it is never reported back as a transport-initiated close.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Payload, TransferFormat};

use super::{Transport, TransportHandlers, TransportKind};

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Internal commands for the event loop.
enum TransportCommand {
    /// Write one frame and report the outcome.
    Send {
        payload: Payload,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Close the socket and exit.
    Shutdown { done_tx: oneshot::Sender<()> },
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Full-duplex transport over a WebSocket.
///
/// `http`/`https` urls are mapped to `ws`/`wss`.
pub struct WebSocketTransport {
    /// Callback slots (shared with event loop).
    handlers: Arc<Mutex<TransportHandlers>>,
    /// Channel to the event loop, `None` until connected and after stop.
    command_tx: Mutex<Option<mpsc::UnboundedSender<TransportCommand>>>,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketTransport {
    /// Creates an unconnected transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(TransportHandlers::default())),
            command_tx: Mutex::new(None),
        }
    }

    /// Returns `true` while the event loop is running.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.command_tx
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Rewrites an http(s) url to the matching ws(s) scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportConnect`] for schemes with no WebSocket form.
    pub fn socket_url(url: &Url) -> Result<Url> {
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(Error::connect_failed(
                    TransportKind::WebSockets,
                    format!("unsupported url scheme '{other}'"),
                ));
            }
        };

        let mut socket_url = url.clone();
        socket_url.set_scheme(scheme).map_err(|()| {
            Error::connect_failed(TransportKind::WebSockets, "cannot rewrite url scheme")
        })?;
        Ok(socket_url)
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        handlers: Arc<Mutex<TransportHandlers>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let close_error = loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Text frame received");
                            let handlers = handlers.lock().clone();
                            handlers.receive(Payload::Text(text.as_str().to_owned()));
                        }

                        Some(Ok(Message::Binary(data))) => {
                            trace!(len = data.len(), "Binary frame received");
                            let handlers = handlers.lock().clone();
                            handlers.receive(Payload::Binary(data.to_vec()));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break Self::close_error(frame);
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break Some(Error::WebSocket(e));
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break None;
                        }

                        // Ping/Pong are answered by tungstenite
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send { payload, result_tx }) => {
                            let frame = match payload {
                                Payload::Text(text) => Message::Text(text.into()),
                                Payload::Binary(data) => Message::Binary(data.into()),
                            };
                            let result = ws_write.send(frame).await.map_err(Error::from);
                            let _ = result_tx.send(result);
                        }

                        Some(TransportCommand::Shutdown { done_tx }) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            let _ = done_tx.send(());
                            return;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            return;
                        }
                    }
                }
            }
        };

        let handlers = handlers.lock().clone();
        handlers.close(close_error);

        debug!("Event loop terminated");
    }

    /// Maps a remote close frame to the error reported through `on_close`.
    ///
    /// Only a normal close without a reason counts as clean.
    fn close_error(frame: Option<CloseFrame>) -> Option<Error> {
        frame
            .filter(|frame| frame.code != CloseCode::Normal || !frame.reason.is_empty())
            .map(|frame| Error::transport_closed(u16::from(frame.code), frame.reason.as_str()))
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn name(&self) -> &str {
        TransportKind::WebSockets.as_str()
    }

    fn set_handlers(&self, handlers: TransportHandlers) {
        *self.handlers.lock() = handlers;
    }

    async fn connect(&self, url: &Url, requested: TransferFormat) -> Result<TransferFormat> {
        if self.is_connected() {
            return Err(Error::connect_failed(
                TransportKind::WebSockets,
                "transport is already connected",
            ));
        }

        let socket_url = Self::socket_url(url)?;
        debug!(url = %socket_url, format = %requested, "Connecting WebSocket");

        let (ws_stream, _response) = connect_async(socket_url.as_str())
            .await
            .map_err(|e| Error::connect_failed(TransportKind::WebSockets, e.to_string()))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&self.handlers),
        ));
        *self.command_tx.lock() = Some(command_tx);

        debug!(url = %socket_url, "WebSocket connected");

        // Both frame kinds are native, so the requested format is granted as-is.
        Ok(requested)
    }

    async fn send(&self, payload: Payload) -> Result<()> {
        let (result_tx, result_rx) = oneshot::channel();

        self.command_tx
            .lock()
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .send(TransportCommand::Send { payload, result_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        result_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    async fn stop(&self) -> Result<()> {
        *self.handlers.lock() = TransportHandlers::default();

        let Some(command_tx) = self.command_tx.lock().take() else {
            return Ok(());
        };

        let (done_tx, done_rx) = oneshot::channel();
        if command_tx
            .send(TransportCommand::Shutdown { done_tx })
            .is_err()
        {
            debug!("WebSocket event loop already terminated");
            return Ok(());
        }

        let _ = done_rx.await;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_maps_schemes() {
        let http = Url::parse("http://example.com/chat?id=1").expect("url");
        let https = Url::parse("https://example.com/chat").expect("url");

        assert_eq!(
            WebSocketTransport::socket_url(&http).expect("map").as_str(),
            "ws://example.com/chat?id=1"
        );
        assert_eq!(
            WebSocketTransport::socket_url(&https).expect("map").as_str(),
            "wss://example.com/chat"
        );
    }

    #[test]
    fn test_socket_url_rejects_other_schemes() {
        let url = Url::parse("ftp://example.com/chat").expect("url");
        assert!(WebSocketTransport::socket_url(&url).is_err());
    }

    #[test]
    fn test_close_error_keeps_reason() {
        let frame = CloseFrame {
            code: CloseCode::Policy,
            reason: "Unauthorized: redirect to /login/".into(),
        };
        let err = WebSocketTransport::close_error(Some(frame)).expect("error");
        assert_eq!(err.close_reason(), Some("Unauthorized: redirect to /login/"));
    }

    #[test]
    fn test_close_error_normal_without_reason_is_clean() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        assert!(WebSocketTransport::close_error(Some(frame)).is_none());
        assert!(WebSocketTransport::close_error(None).is_none());
    }

    #[test]
    fn test_close_error_keeps_abnormal_code() {
        let frame = CloseFrame {
            code: CloseCode::Error,
            reason: "".into(),
        };
        let err = WebSocketTransport::close_error(Some(frame)).expect("error");
        assert!(matches!(err, Error::TransportClosed { code: 1011, .. }));
    }

    #[tokio::test]
    async fn test_stop_after_event_loop_exit_is_ok() {
        let transport = WebSocketTransport::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        drop(command_rx);
        *transport.command_tx.lock() = Some(command_tx);

        transport.stop().await.expect("stop");
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        let transport = WebSocketTransport::new();
        let err = transport.send(Payload::text("hi")).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_stop_before_connect_is_noop() {
        let transport = WebSocketTransport::new();
        transport.stop().await.expect("stop");
        assert!(!transport.is_connected());
    }
}
