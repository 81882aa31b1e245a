//! Data models
//!
//! Shared between the server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (Postgres BIGSERIAL).

pub mod message;
pub mod notification;
pub mod order;
pub mod role;
pub mod shop;

// Re-exports
pub use message::*;
pub use notification::*;
pub use order::*;
pub use role::*;
pub use shop::*;
