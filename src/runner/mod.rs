//! Process runner: admission, spawn, stream relaying, exit wait.

pub mod codec;
mod task;

pub use codec::{OutputLineCodec, MAX_LINE_BYTES};
pub use task::run_task;
