//! Spawns one task and relays its output into the session frame queue.
//!
//! The task runs in a new process group rooted at its working directory,
//! with the environment fully replaced by the request's `KEY=VALUE` entries.
//! Two reader tasks stream stdout and stderr line by line; the wait task
//! records the exit. No cooperative cancellation reaches the readers — they
//! end on stream EOF, which follows from process exit or the teardown
//! group-kill.

use std::process::Stdio;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::process::Command;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::models::{OutputFrame, TaskSpec};
use crate::runner::codec::OutputLineCodec;
use crate::session::queue::FrameQueue;
use crate::session::registry::{ProcessHandle, ProcessRegistry};
use crate::AppError;

/// Run one validated task to completion.
///
/// Admission, spawn, stream relaying, and exit wait all happen here; the
/// session read loop never blocks on any of it. Every failure is reported as
/// at most one Text frame and is scoped to this task alone.
pub async fn run_task(
    session_id: String,
    spec: TaskSpec,
    queue: Arc<FrameQueue>,
    registry: Arc<ProcessRegistry>,
) {
    // Admission before spawn: a full registry refuses the task outright.
    let Some(ticket) = registry.try_admit() else {
        warn!(session_id, name = spec.name, "process registry full, task refused");
        queue.push(OutputFrame::text(format!(
            "task refused: process registry full ({})",
            spec.name
        )));
        return;
    };

    let mut cmd = Command::new(&spec.name);
    cmd.args(&spec.args)
        .current_dir(&spec.home)
        .env_clear()
        .envs(spec.env_pairs())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            let spawn_err = AppError::Spawn(format!("failed to start {}: {err}", spec.name));
            warn!(session_id, name = spec.name, %spawn_err, "task spawn failed");
            queue.push(OutputFrame::text(spawn_err.to_string()));
            drop(ticket);
            return;
        }
    };

    // With process_group(0) the child is its own group leader, so pid == pgid.
    let pgid = child.id().and_then(|pid| i32::try_from(pid).ok()).unwrap_or(0);
    let handle = ProcessHandle::new(pgid);

    if !ticket.commit(handle.clone()) {
        // Teardown swept the registry between admission and commit; this
        // group missed the sweep and must be reclaimed here.
        warn!(session_id, pgid, "session draining, killing freshly spawned task");
        handle.kill_group();
    }

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(relay_stream(
            session_id.clone(),
            "stdout",
            stdout,
            Arc::clone(&queue),
        ));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(relay_stream(
            session_id.clone(),
            "stderr",
            stderr,
            Arc::clone(&queue),
        ));
    }

    match child.wait().await {
        Ok(status) => {
            match status.code() {
                Some(code) => handle.record_exit(code),
                None => handle.record_killed(),
            }
            // No frame announces a successful exit; stream closure is the
            // only signal the peer gets.
            info!(session_id, pgid, %status, "task exited");
        }
        Err(err) => {
            warn!(session_id, pgid, %err, "error waiting for task");
            queue.push(OutputFrame::text(format!(
                "wait failed for {}: {err}",
                spec.name
            )));
        }
    }
}

/// Relay one standard stream into the frame queue, one Text frame per line.
///
/// A full queue drops the line silently. An oversized line is skipped; a
/// pipe read failure ends this reader only.
async fn relay_stream<R>(
    session_id: String,
    stream_name: &'static str,
    pipe: R,
    queue: Arc<FrameQueue>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut framed = FramedRead::new(pipe, OutputLineCodec::new());

    while let Some(item) = framed.next().await {
        match item {
            Ok(line) => {
                if !queue.push(OutputFrame::text(line.into_bytes())) {
                    debug!(
                        session_id,
                        stream = stream_name,
                        "frame queue full, output line dropped"
                    );
                }
            }
            Err(AppError::Stream(msg)) => {
                warn!(
                    session_id,
                    stream = stream_name,
                    error = msg.as_str(),
                    "oversized output line skipped"
                );
            }
            Err(err) => {
                warn!(session_id, stream = stream_name, %err, "stream read failed, reader stopping");
                break;
            }
        }
    }

    debug!(session_id, stream = stream_name, "stream reader finished");
}
