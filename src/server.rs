//! HTTP server wiring: WebSocket upgrade endpoint and health probe.
//!
//! Every accepted `GET /ws` upgrade hands the socket to a session
//! controller; the peer address is captured via [`ConnectInfo`] so accepted
//! requests can be stamped with their origin.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RelayConfig;
use crate::session;
use crate::{AppError, Result};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<RelayConfig>,
    /// Root shutdown token; sessions derive their own child tokens from it.
    pub shutdown: CancellationToken,
}

/// Handler for `GET /health` — returns 200 OK with a plain-text body.
///
/// Useful for probing liveness without opening a session.
async fn health() -> &'static str {
    "ok"
}

/// Handler for `GET /ws` — upgrade and hand the socket to a session.
async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| {
        session::run_session(socket, peer, Arc::clone(&state.config), state.shutdown.clone())
    })
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the listener fails to bind, or
/// `AppError::Io` if serving fails.
pub async fn serve(config: Arc<RelayConfig>, ct: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind {}: {err}", config.bind_addr)))?;
    serve_on(listener, config, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// Split out so tests can bind an ephemeral port themselves.
///
/// # Errors
///
/// Returns `AppError::Io` if serving fails.
pub async fn serve_on(
    listener: TcpListener,
    config: Arc<RelayConfig>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::Io(err.to_string()))?;
    info!(%addr, "task-relay listening");

    let state = AppState {
        config,
        shutdown: ct.clone(),
    };

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(ct.cancelled_owned())
    .await
    .map_err(|err| AppError::Io(err.to_string()))
}
