//! Configuration
//!
//! Shared types, the judge.json loader, and the built-in language presets.

pub mod loader;
pub mod presets;
pub mod types;
