//! Shared types for the PrintEasy platform
//!
//! Common types used across the server and tooling: domain models, the
//! availability resolver, error types, live wire-event payloads, and
//! utility helpers.

pub mod availability;
pub mod error;
pub mod live;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Live event re-exports (for convenient access)
pub use live::LiveEvent;
