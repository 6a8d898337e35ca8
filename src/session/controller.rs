//! Session controller.
//!
//! Owns one control connection from first message to teardown, driving the
//! `Open → Active → Closing → Closed` state machine. The read loop never
//! blocks on spawned work: runners are launched asynchronously and report
//! back only through the frame queue.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::models::{OutputFrame, TaskRequest};
use crate::runner;
use crate::session::prober::run_prober;
use crate::session::queue::FrameQueue;
use crate::session::registry::ProcessRegistry;
use crate::session::writer::{run_writer, SharedSink};

/// Transport protocol stamped onto accepted requests.
const PEER_PROTOCOL: &str = "tcp";

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connection upgraded; nothing read yet.
    Open,
    /// First message read; writer and prober running.
    Active,
    /// Teardown in progress: group-kill, drain, queue closure.
    Closing,
    /// Terminal; all resources released.
    Closed,
}

fn advance(session_id: &str, state: &mut SessionState, next: SessionState) {
    debug!(session_id, from = ?*state, to = ?next, "session state advanced");
    *state = next;
}

/// Run one session to completion.
///
/// `shutdown` is the server's root token; a child token scopes teardown
/// signals (writer or prober write failures) to this session while still
/// observing server shutdown.
pub async fn run_session(
    socket: WebSocket,
    peer: SocketAddr,
    config: Arc<RelayConfig>,
    shutdown: CancellationToken,
) {
    let session_id = Uuid::new_v4().to_string();
    let (sink, mut stream) = socket.split();
    let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(sink));

    let queue = Arc::new(FrameQueue::new(config.queue_capacity));
    let registry = Arc::new(ProcessRegistry::new(config.registry_capacity));
    let cancel = shutdown.child_token();

    let mut state = SessionState::Open;
    info!(session_id, peer = %peer, "session open");

    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => {
                debug!(session_id, "session cancelled");
                break;
            }
            message = stream.next() => message,
        };

        let payload = match message {
            None => {
                debug!(session_id, "peer closed connection");
                break;
            }
            Some(Err(err)) => {
                debug!(session_id, %err, "inbound read failed");
                break;
            }
            Some(Ok(Message::Close(_))) => {
                debug!(session_id, "peer sent close frame");
                break;
            }
            Some(Ok(Message::Text(text))) => Vec::from(text.as_bytes()),
            Some(Ok(Message::Binary(data))) => Vec::from(&data[..]),
            // Ping/Pong control frames are answered by the transport.
            Some(Ok(_)) => continue,
        };

        if state == SessionState::Open {
            tokio::spawn(run_writer(
                session_id.clone(),
                Arc::clone(&queue),
                Arc::clone(&sink),
                cancel.clone(),
            ));
            tokio::spawn(run_prober(
                session_id.clone(),
                Arc::clone(&sink),
                config.ping_interval(),
                cancel.clone(),
            ));
            advance(&session_id, &mut state, SessionState::Active);
        }

        handle_request(&session_id, &payload, peer, &queue, &registry);
    }

    advance(&session_id, &mut state, SessionState::Closing);
    info!(session_id, tasks = registry.len(), "session closing");

    // Exactly one kill signal per admitted group, even if it already exited.
    for handle in registry.drain() {
        handle.kill_group();
    }

    // Let already-enqueued frames reach the peer before the queue closes.
    tokio::time::sleep(config.drain_interval()).await;
    queue.close();
    cancel.cancel();

    advance(&session_id, &mut state, SessionState::Closed);
    info!(session_id, "session closed");
}

/// Decode, validate, acknowledge, and launch one task request.
///
/// Any decode or validation failure is logged and swallowed — the session
/// keeps reading.
fn handle_request(
    session_id: &str,
    payload: &[u8],
    peer: SocketAddr,
    queue: &Arc<FrameQueue>,
    registry: &Arc<ProcessRegistry>,
) {
    let request = match TaskRequest::decode(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(session_id, %err, "discarding malformed task request");
            return;
        }
    };

    let spec = match request.validate(&peer.to_string(), PEER_PROTOCOL) {
        Ok(spec) => spec,
        Err(err) => {
            warn!(session_id, %err, "discarding invalid task request");
            return;
        }
    };

    // Echo the accepted request back as an acknowledgement frame.
    match serde_json::to_vec(&spec) {
        Ok(ack) => {
            if !queue.push(OutputFrame::text(ack)) {
                debug!(session_id, "frame queue full, acknowledgement dropped");
            }
        }
        Err(err) => warn!(session_id, %err, "failed to serialise acknowledgement"),
    }

    info!(session_id, name = spec.name, home = spec.home, "task accepted");
    tokio::spawn(runner::run_task(
        session_id.to_owned(),
        spec,
        Arc::clone(queue),
        Arc::clone(registry),
    ));
}
