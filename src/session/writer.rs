//! Connection writer task.
//!
//! The single task permitted to drain the session's frame queue. Each frame
//! is written to the WebSocket sink under the lock shared with the liveness
//! prober, because the underlying connection does not tolerate concurrent
//! writers.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::{FrameKind, OutputFrame};
use crate::session::queue::FrameQueue;

/// Outbound half of the WebSocket, shared between the writer and the prober.
pub type SharedSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Map one frame onto its WebSocket message representation.
fn frame_to_message(frame: OutputFrame) -> Message {
    match frame.kind {
        FrameKind::Ping => Message::Ping(frame.payload),
        FrameKind::Pong => Message::Pong(frame.payload),
        FrameKind::Binary => Message::Binary(frame.payload),
        FrameKind::Text => {
            Message::Text(String::from_utf8_lossy(&frame.payload).into_owned().into())
        }
    }
}

/// Drain `queue` to the sink until the queue closes or a write fails.
///
/// Frames are delivered in the order they were accepted into the queue. A
/// write failure is fatal to the session: nothing else observes outbound
/// errors, so the writer cancels `cancel` to signal teardown before exiting.
pub async fn run_writer(
    session_id: String,
    queue: Arc<FrameQueue>,
    sink: SharedSink,
    cancel: CancellationToken,
) {
    while let Some(frame) = queue.pop().await {
        let message = frame_to_message(frame);
        let mut guard = sink.lock().await;
        if let Err(err) = guard.send(message).await {
            warn!(session_id, %err, "outbound write failed, tearing session down");
            cancel.cancel();
            return;
        }
    }
    debug!(session_id, "frame queue closed, writer exiting");
}
