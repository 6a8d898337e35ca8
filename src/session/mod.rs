//! Session layer: one control connection's lifetime and its plumbing.

pub mod controller;
pub mod prober;
pub mod queue;
pub mod registry;
pub mod writer;

pub use controller::run_session;
