//! Outbound frames placed into a session's frame queue.

use bytes::Bytes;

/// Kind discriminant for one outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Liveness probe.
    Ping,
    /// Liveness probe answer.
    Pong,
    /// UTF-8 payload: one subprocess output line or a JSON acknowledgement.
    Text,
    /// Raw binary payload.
    Binary,
}

/// One discrete unit of outbound data, control or payload.
///
/// Produced by process runners and the acknowledgement path; consumed
/// exactly once, in enqueue order, by the connection writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Frame payload bytes.
    pub payload: Bytes,
}

impl OutputFrame {
    /// Build a Text frame from a UTF-8 payload.
    #[must_use]
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Text,
            payload: payload.into(),
        }
    }

    /// Build a Binary frame.
    #[must_use]
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Binary,
            payload: payload.into(),
        }
    }

    /// Build an empty Ping frame.
    #[must_use]
    pub fn ping() -> Self {
        Self {
            kind: FrameKind::Ping,
            payload: Bytes::new(),
        }
    }

    /// Build an empty Pong frame.
    #[must_use]
    pub fn pong() -> Self {
        Self {
            kind: FrameKind::Pong,
            payload: Bytes::new(),
        }
    }
}
