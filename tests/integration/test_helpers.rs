//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use task_relay::config::RelayConfig;
use task_relay::server;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test configuration with short probe and drain intervals.
pub fn test_config() -> RelayConfig {
    RelayConfig {
        ping_interval_seconds: 1,
        drain_seconds: 1,
        ..RelayConfig::default()
    }
}

/// Spawn the server on an ephemeral port.
///
/// Caller must cancel the returned token to shut the server down.
pub async fn spawn_server(config: RelayConfig) -> (SocketAddr, CancellationToken) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    tokio::spawn(async move {
        let _ = server::serve_on(listener, Arc::new(config), server_ct).await;
    });

    (addr, ct)
}

/// Open a WebSocket connection to the server's `/ws` endpoint.
pub async fn connect(addr: SocketAddr) -> WsClient {
    let (client, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connect");
    client
}

/// Build one task request message.
pub fn task_message(home: &str, name: &str, args: &[&str], envs: &[&str]) -> Message {
    let request = serde_json::json!({
        "home": home,
        "name": name,
        "args": args,
        "envs": envs,
    });
    Message::Text(request.to_string().into())
}

/// Read frames until the next Text frame, skipping Ping/Pong control
/// traffic. Panics after `timeout` without one.
pub async fn next_text(client: &mut WsClient, timeout: Duration) -> String {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .expect("timed out waiting for a text frame");
        let message = tokio::time::timeout(remaining, client.next())
            .await
            .expect("timed out waiting for a text frame")
            .expect("connection closed while waiting for a text frame")
            .expect("websocket read failed");

        match message {
            Message::Text(text) => return text.to_string(),
            Message::Ping(_) | Message::Pong(_) => {}
            other => panic!("unexpected frame while waiting for text: {other:?}"),
        }
    }
}
