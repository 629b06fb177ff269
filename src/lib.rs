//! judgebox: an online-judge execution engine
//! Runs untrusted submissions against a problem's test cases under time and
//! memory limits, on either the host or a disposable container per step
//!
//! # Architecture
//!
//! ## Judging ([`judge`])
//! - [`judge::language`]: Language profiles and command templates
//! - [`judge::registry`]: The fixed language table
//! - [`judge::orchestrator`]: Test case sequencing and verdict resolution
//! - [`judge::repository`]: Persistence seam and in-memory store
//! - [`judge::model`]: Problems, test cases, submissions and reports
//!
//! ## Verdicts ([`verdict`])
//! - [`verdict::verdict`]: Submission verdict state machine
//! - [`verdict::normalize`]: Output normalization for answer comparison
//!
//! ## Execution Backends ([`backend`])
//! - [`backend::local`]: Unsandboxed child processes
//! - [`backend::container`]: Disposable docker container per step
//! - [`backend::pipeline`]: Compile-then-run sequencing shared by both
//! - [`backend::toolchain`]: Platform tool names chosen at startup
//!
//! ## Process Control ([`exec`])
//! - [`exec::runner`]: Bounded process runner with concurrent capture
//! - [`exec::output`]: Bounded output collection
//! - [`exec::terminate`]: Process tree termination
//!
//! ## Safety & Cleanup ([`safety`])
//! - [`safety::workspace`]: Per-attempt disposable workspaces
//!
//! ## Configuration ([`config`])
//! - [`config::loader`]: judge.json loading and validation
//! - [`config::types`]: Execution types and the error taxonomy
//! - [`config::presets`]: Built-in language table
//!
//! # Design Principles
//!
//! 1. **One backend per process** - chosen from configuration at startup
//! 2. **Exit status is truth** - stderr text is diagnostics, never a verdict
//! 3. **Nothing unclassified escapes a backend** - failures become results
//! 4. **Workspaces never overlap** - unique names instead of locks

// Judging
pub mod judge;

// Verdicts
pub mod verdict;

// Execution Backends
pub mod backend;

// Process Control
pub mod exec;

// Safety & Cleanup
pub mod safety;

// Configuration
pub mod config;

// CLI entrypoint for the judge binary
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
