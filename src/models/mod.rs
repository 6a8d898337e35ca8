//! Wire-level data types shared between the session layer and runners.

pub mod frame;
pub mod request;

pub use frame::{FrameKind, OutputFrame};
pub use request::{TaskRequest, TaskSpec};
