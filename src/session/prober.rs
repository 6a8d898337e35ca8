//! Liveness prober.
//!
//! Writes a Ping frame at a fixed interval directly on the outbound sink,
//! bypassing the frame queue so liveness is never starved by a full queue.
//! Shares the sink lock with the connection writer.

use std::time::Duration;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures_util::SinkExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::writer::SharedSink;

/// Probe the peer until cancellation or a failed write.
///
/// A write failure means the peer is unresponsive; the prober cancels
/// `cancel` to trigger session teardown and stops.
pub async fn run_prober(
    session_id: String,
    sink: SharedSink,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(session_id, "prober cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let mut guard = sink.lock().await;
        let result = guard.send(Message::Ping(Bytes::new())).await;
        drop(guard);

        if let Err(err) = result {
            warn!(session_id, %err, "liveness probe failed, tearing session down");
            cancel.cancel();
            return;
        }
        debug!(session_id, "liveness probe sent");
    }
}
