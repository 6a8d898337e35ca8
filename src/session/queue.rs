//! Bounded, lossy, single-consumer frame queue.
//!
//! All process runners of one session (and the session's acknowledgement
//! path) push into the queue; the connection writer is the only consumer.
//! `push` never blocks: a full or closed queue drops the newest frame and
//! reports the drop through the return flag.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::models::OutputFrame;

#[derive(Debug)]
struct Inner {
    frames: VecDeque<OutputFrame>,
    closed: bool,
}

/// Capacity-bounded frame queue shared by all producers of one session.
#[derive(Debug)]
pub struct FrameQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    notify: Notify,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` pending frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Non-blocking enqueue.
    ///
    /// Returns `false` when the frame was dropped because the queue is full
    /// or already closed. A dropped frame leaves no record.
    pub fn push(&self, frame: OutputFrame) -> bool {
        let mut inner = self.lock();
        if inner.closed || inner.frames.len() >= self.capacity {
            return false;
        }
        inner.frames.push_back(frame);
        drop(inner);
        self.notify.notify_one();
        true
    }

    /// Dequeue the next frame, waiting while the queue is open and empty.
    ///
    /// Frames accepted before closure still drain; `None` means the queue is
    /// closed and fully drained.
    pub async fn pop(&self) -> Option<OutputFrame> {
        loop {
            {
                let mut inner = self.lock();
                if let Some(frame) = inner.frames.pop_front() {
                    return Some(frame);
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Close the queue. Further pushes are dropped; the consumer drains the
    /// remainder and then observes the closed sentinel.
    pub fn close(&self) {
        self.lock().closed = true;
        // notify_one stores a permit, so a consumer between its empty check
        // and the await still wakes.
        self.notify.notify_one();
    }

    /// Number of pending frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether no frames are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
