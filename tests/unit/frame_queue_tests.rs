//! Unit tests for the bounded frame queue.
//!
//! Validates FIFO ordering, the drop-newest overflow policy, and the
//! close/drain semantics the connection writer relies on.

use std::sync::Arc;
use std::time::Duration;

use task_relay::models::OutputFrame;
use task_relay::session::queue::FrameQueue;

fn text(payload: &'static str) -> OutputFrame {
    OutputFrame::text(payload)
}

#[tokio::test]
async fn accepted_frames_dequeue_in_fifo_order() {
    let queue = FrameQueue::new(10);
    assert!(queue.push(text("first")));
    assert!(queue.push(text("second")));
    assert!(queue.push(text("third")));

    assert_eq!(queue.pop().await, Some(text("first")));
    assert_eq!(queue.pop().await, Some(text("second")));
    assert_eq!(queue.pop().await, Some(text("third")));
}

/// N+1 pushes into a queue of capacity N, with no concurrent consumer,
/// leave exactly N retrievable frames. The excess is dropped without
/// blocking the producer.
#[tokio::test]
async fn overflow_drops_newest_without_blocking() {
    let capacity = 5;
    let queue = FrameQueue::new(capacity);

    for i in 0..capacity {
        assert!(queue.push(OutputFrame::text(format!("frame-{i}"))), "push {i}");
    }
    assert!(!queue.push(text("overflow")), "push past capacity must drop");

    assert_eq!(queue.len(), capacity);
    queue.close();
    for i in 0..capacity {
        let frame = queue.pop().await.expect("frame should drain");
        assert_eq!(frame.payload, format!("frame-{i}").as_bytes());
    }
    assert_eq!(queue.pop().await, None, "dropped frame must leave no record");
}

#[tokio::test]
async fn push_after_close_is_dropped() {
    let queue = FrameQueue::new(4);
    queue.close();
    assert!(!queue.push(text("late")));
    assert!(queue.is_empty());
}

#[tokio::test]
async fn close_drains_pending_frames_then_returns_sentinel() {
    let queue = FrameQueue::new(4);
    assert!(queue.push(text("pending")));
    queue.close();
    assert!(queue.is_closed());

    assert_eq!(queue.pop().await, Some(text("pending")));
    assert_eq!(queue.pop().await, None);
}

#[tokio::test]
async fn pop_waits_for_a_concurrent_push() {
    let queue = Arc::new(FrameQueue::new(4));

    let producer = Arc::clone(&queue);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        producer.push(text("late arrival"));
    });

    let frame = tokio::time::timeout(Duration::from_secs(2), queue.pop())
        .await
        .expect("pop should complete once the frame arrives");
    assert_eq!(frame, Some(text("late arrival")));
}

#[tokio::test]
async fn close_wakes_a_waiting_consumer() {
    let queue = Arc::new(FrameQueue::new(4));

    let consumer = Arc::clone(&queue);
    let waiter = tokio::spawn(async move { consumer.pop().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    queue.close();

    let result = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("waiting consumer must wake on close")
        .expect("consumer task must not panic");
    assert_eq!(result, None);
}
