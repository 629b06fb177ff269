//! Execution control
//!
//! The process runner every backend delegates to: spawn, stdin feeding,
//! concurrent bounded output capture, timeout and process-tree termination.

pub mod output;
pub mod runner;
pub mod terminate;

pub use runner::{ProcessRunner, RunOutcome};
