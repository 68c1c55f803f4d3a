//! End-to-end tests of the WebSocket transport against a local server.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use duplex_connection::{
    Connection, ConnectionState, Error, Payload, TransferFormat, TransportKind,
};

use common::init_tracing;

// ============================================================================
// Server
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

/// Accepts one socket. Echoes every data frame; `"kick"` closes the socket
/// with an unauthorized redirect.
async fn spawn_server() -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut socket) = accept_async(stream).await else {
            return;
        };

        while let Some(Ok(message)) = socket.next().await {
            if let Message::Text(text) = &message
                && text.as_str() == "kick"
            {
                let frame = CloseFrame {
                    code: CloseCode::Policy,
                    reason: "Unauthorized: redirect to /login/".into(),
                };
                let _ = socket.close(Some(frame)).await;
                break;
            }

            if message.is_close() {
                break;
            }

            if (message.is_text() || message.is_binary()) && socket.send(message).await.is_err() {
                break;
            }
        }
    });

    Ok(addr)
}

fn connection_to(addr: SocketAddr) -> anyhow::Result<Connection> {
    init_tracing();
    Ok(Connection::builder(format!("http://{addr}/chat"))
        .transport(TransportKind::WebSockets)
        .skip_negotiation()
        .transfer_format(TransferFormat::Binary)
        .build()?)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn echoes_text_and_binary_payloads() -> anyhow::Result<()> {
    let addr = spawn_server().await?;
    let connection = connection_to(addr)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.on_receive(move |payload| {
        let _ = tx.send(payload);
    });

    connection.start().await?;
    assert_eq!(connection.state(), ConnectionState::Connected);
    assert_eq!(connection.transfer_format(), TransferFormat::Binary);

    connection.send(Payload::text("hello")).await?;
    connection.send(Payload::binary(vec![0xde, 0xad])).await?;

    assert_eq!(timeout(WAIT, rx.recv()).await?, Some(Payload::text("hello")));
    assert_eq!(
        timeout(WAIT, rx.recv()).await?,
        Some(Payload::binary(vec![0xde, 0xad]))
    );

    connection.stop().await;
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    Ok(())
}

#[tokio::test]
async fn local_stop_reports_clean_close() -> anyhow::Result<()> {
    let addr = spawn_server().await?;
    let connection = connection_to(addr)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    connection.on_close(move |error: Option<Error>| {
        let _ = tx.send(error.map(|e| e.to_string()));
    });

    connection.start().await?;
    connection.stop().await;

    assert_eq!(timeout(WAIT, rx.recv()).await?, Some(None));
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn redirect_close_from_server_reaches_callbacks() -> anyhow::Result<()> {
    let addr = spawn_server().await?;
    let (redirect_tx, mut redirect_rx) = mpsc::unbounded_channel();

    init_tracing();
    let connection = Connection::builder(format!("http://{addr}/chat"))
        .transport(TransportKind::WebSockets)
        .skip_negotiation()
        .on_unauthorized(move |location| {
            let _ = redirect_tx.send(location.to_string());
        })
        .build()?;

    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    connection.on_close(move |error| {
        let _ = close_tx.send(error);
    });

    connection.start().await?;
    connection.send(Payload::text("kick")).await?;

    assert_eq!(
        timeout(WAIT, redirect_rx.recv()).await?.as_deref(),
        Some("/login")
    );
    let closed = timeout(WAIT, close_rx.recv()).await?;
    assert!(matches!(closed, Some(Some(Error::Unauthorized { .. }))));
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    Ok(())
}

#[tokio::test]
async fn connect_to_closed_port_fails_start() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let connection = connection_to(addr)?;
    let err = connection.start().await.unwrap_err();

    assert!(matches!(err, Error::TransportConnect { .. }));
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    Ok(())
}
